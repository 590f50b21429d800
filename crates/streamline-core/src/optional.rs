//! # Optional Module
//!
//! Recoverable absence is plain `Option<T>`. Chaining uses the native
//! combinators (`filter`, `map`, `and_then`, `unwrap_or`,
//! `unwrap_or_else`); this module only adds the fallible accessor and
//! two partial arithmetic helpers.

use crate::types::StreamError;

/// Fallible access to an optional result.
pub trait OptionalExt<T> {
    /// The contained value, or [`StreamError::NoValuePresent`].
    fn get_or_fail(self) -> Result<T, StreamError>;
}

impl<T> OptionalExt<T> for Option<T> {
    fn get_or_fail(self) -> Result<T, StreamError> {
        self.ok_or(StreamError::NoValuePresent)
    }
}

/// `1 / d`, or `None` when `d` is zero.
pub fn inverse(d: f64) -> Option<f64> {
    (d != 0.0).then(|| 1.0 / d)
}

/// `sqrt(d)`, or `None` when `d` is zero, negative or NaN.
pub fn square_root(d: f64) -> Option<f64> {
    (d > 0.0).then(|| d.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Roster;

    #[test]
    fn get_or_fail_on_empty() {
        assert_eq!(Some(3).get_or_fail(), Ok(3));
        assert_eq!(None::<i32>.get_or_fail(), Err(StreamError::NoValuePresent));
    }

    #[test]
    fn get_or_fail_on_empty_pipeline_result() {
        let oldest_minor = Roster::sample()
            .stream()
            .filter(|e| e.age < 10)
            .max_by_key(|e| e.age)
            .get_or_fail();
        assert_eq!(oldest_minor.map(|e| e.name), Err(StreamError::NoValuePresent));
    }

    #[test]
    fn partial_helpers_chain() {
        assert_eq!(inverse(4.0).and_then(square_root), Some(0.5));
        assert_eq!(inverse(0.0).and_then(square_root).unwrap_or(0.0), 0.0);
        assert_eq!(square_root(0.0), None);
        assert_eq!(square_root(-4.0), None);
        assert_eq!(inverse(-2.0), Some(-0.5));
    }

    #[test]
    fn native_option_combinators() {
        let name = Roster::sample()
            .stream()
            .find_first()
            .filter(|e| e.age > 10)
            .map(|e| e.name.to_uppercase())
            .unwrap_or_else(|| "NOBODY".to_string());
        assert_eq!(name, "ZHANG SAN");
    }
}
