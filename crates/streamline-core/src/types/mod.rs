//! # Core Type Definitions
//!
//! This module contains the fixture data model and the error type:
//! - Fixture record (`Employee`)
//! - Explicitly constructed fixture collection (`Roster`)
//! - Error types (`StreamError`)
//!
//! ## Fixture Guarantees
//!
//! - `Employee` equality and hashing use the name only
//! - A `Roster` is immutable once built; pipelines borrow nothing from it
//!   and clone the records they stream

use crate::pipeline::Stream;
use crate::source;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::Path;
use thiserror::Error;

// =============================================================================
// EMPLOYEE
// =============================================================================

/// A flat employee record used as fixture data.
///
/// Two employees are equal when their names are equal, regardless of age
/// or salary. `Hash` follows the same rule so that hashed collections
/// agree with `PartialEq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    /// Display name. Not unique across a roster.
    pub name: String,
    /// Age in years.
    pub age: u32,
    /// Exact decimal salary.
    pub salary: Decimal,
}

impl Employee {
    /// Create a new employee record.
    #[must_use]
    pub fn new(name: impl Into<String>, age: u32, salary: Decimal) -> Self {
        Self {
            name: name.into(),
            age,
            salary,
        }
    }

    /// Salary as a float, for statistics and averaging.
    #[must_use]
    pub fn salary_f64(&self) -> f64 {
        rust_decimal::prelude::ToPrimitive::to_f64(&self.salary).unwrap_or(0.0)
    }
}

impl PartialEq for Employee {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Employee {}

impl Hash for Employee {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

// =============================================================================
// ROSTER
// =============================================================================

/// An explicitly constructed, immutable list of employees.
///
/// Rosters are passed to whatever needs fixture data instead of living in
/// a shared global.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    employees: Vec<Employee>,
}

impl Roster {
    /// Build a roster from a list of employees. Order is preserved.
    #[must_use]
    pub fn new(employees: Vec<Employee>) -> Self {
        Self { employees }
    }

    /// The eight-record catalogue roster.
    ///
    /// The last two records share the name "Li Jiu" and therefore compare
    /// equal; grouping and map-collection demos rely on that collision.
    #[must_use]
    pub fn sample() -> Self {
        let rows: [(&str, u32, i64); 8] = [
            ("Zhang San", 16, 1000),
            ("Li Si", 18, 2000),
            ("Wang Wu", 25, 3000),
            ("Zhao Liu", 30, 4000),
            ("Feng Qi", 35, 5000),
            ("Yang Ba", 50, 6000),
            ("Li Jiu", 50, 7000),
            ("Li Jiu", 55, 8000),
        ];
        Self::new(
            rows.iter()
                .map(|&(name, age, salary)| Employee::new(name, age, Decimal::from(salary)))
                .collect(),
        )
    }

    /// All employees in roster order.
    #[must_use]
    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Number of employees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.employees.len()
    }

    /// Check if the roster holds no employees.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    /// A sequential, ordered stream over clones of the employees.
    #[must_use]
    pub fn stream(&self) -> Stream<Employee> {
        source::of(self.employees.clone())
    }

    /// Same as [`Roster::stream`], already switched to parallel mode.
    #[must_use]
    pub fn par_stream(&self) -> Stream<Employee> {
        self.stream().parallel()
    }

    /// Parse a roster from TOML (`[[employees]]` tables).
    pub fn from_toml_str(text: &str) -> Result<Self, StreamError> {
        toml::from_str(text).map_err(|e| StreamError::InvalidFixture(e.to_string()))
    }

    /// Parse a roster from JSON (`{"employees": [...]}`).
    pub fn from_json_str(text: &str) -> Result<Self, StreamError> {
        serde_json::from_str(text).map_err(|e| StreamError::InvalidFixture(e.to_string()))
    }

    /// Load a roster from a `.toml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self, StreamError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StreamError::IoError(format!("Cannot read roster '{}': {}", path.display(), e))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("json") => Self::from_json_str(&text),
            other => Err(StreamError::InvalidFixture(format!(
                "Unsupported roster format: {:?}",
                other.unwrap_or("<none>")
            ))),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while building or evaluating pipelines.
///
/// Recoverable absence is modelled with `Option`; these variants cover the
/// cases where a caller asked for something that cannot be produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    /// A value was requested from an empty optional result without a default.
    #[error("No value present")]
    NoValuePresent,

    /// A map collection met the same key twice under the `Reject` policy.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// A text source was given a pattern that does not compile.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// A bounded source was given an empty range.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Fixture data could not be parsed.
    #[error("Invalid fixture: {0}")]
    InvalidFixture(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn employee_equality_uses_name_only() {
        let a = Employee::new("Li Jiu", 50, Decimal::from(7000));
        let b = Employee::new("Li Jiu", 55, Decimal::from(8000));
        let c = Employee::new("Li Si", 50, Decimal::from(7000));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn employee_hash_agrees_with_equality() {
        let roster = Roster::sample();
        let unique: HashSet<&Employee> = roster.employees().iter().collect();
        assert_eq!(unique.len(), 7);
    }

    #[test]
    fn sample_roster_shape() {
        let roster = Roster::sample();
        assert_eq!(roster.len(), 8);
        assert!(!roster.is_empty());
        assert_eq!(roster.employees()[0].name, "Zhang San");
        assert_eq!(roster.employees()[7].salary, Decimal::from(8000));
    }

    #[test]
    fn roster_from_toml() {
        let text = r#"
            [[employees]]
            name = "Ada"
            age = 36
            salary = "1250.50"

            [[employees]]
            name = "Grace"
            age = 41
            salary = "2000"
        "#;

        let roster = Roster::from_toml_str(text).expect("parse");
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.employees()[0].salary, Decimal::new(125050, 2));
    }

    #[test]
    fn roster_from_json() {
        let text = r#"{"employees":[{"name":"Ada","age":36,"salary":"10"}]}"#;
        let roster = Roster::from_json_str(text).expect("parse");
        assert_eq!(roster.employees()[0].age, 36);
    }

    #[test]
    fn roster_rejects_malformed_fixture() {
        let result = Roster::from_json_str("{\"employees\": 3}");
        assert!(matches!(result, Err(StreamError::InvalidFixture(_))));
    }

    #[test]
    fn salary_as_float() {
        let e = Employee::new("Ada", 36, Decimal::new(125050, 2));
        assert!((e.salary_f64() - 1250.5).abs() < f64::EPSILON);
    }
}
