//! # Function Module
//!
//! Composable function values.
//!
//! Rust closures already cover the single-method interfaces a stream
//! library needs (`Fn(T) -> R`, `Fn(&T) -> bool`, `FnMut(&T)`,
//! `FnMut() -> T`). This module adds the combinators for building them
//! up: composition, predicate algebra, consumer chaining and comparator
//! helpers. Every combinator returns a `Send + Sync` closure so the
//! result can be handed to a parallel pipeline stage.

use std::cmp::Ordering;

// =============================================================================
// FUNCTIONS
// =============================================================================

/// `x -> f(g(x))`.
pub fn compose<A, B, C, F, G>(f: F, g: G) -> impl Fn(A) -> C + Send + Sync
where
    F: Fn(B) -> C + Send + Sync,
    G: Fn(A) -> B + Send + Sync,
{
    move |x| f(g(x))
}

/// `x -> g(f(x))`.
pub fn and_then<A, B, C, F, G>(f: F, g: G) -> impl Fn(A) -> C + Send + Sync
where
    F: Fn(A) -> B + Send + Sync,
    G: Fn(B) -> C + Send + Sync,
{
    move |x| g(f(x))
}

/// The function that returns its argument.
pub fn identity<T>() -> impl Fn(T) -> T + Copy + Send + Sync {
    |x| x
}

/// `(a, b) -> g(bf(a, b))`.
pub fn bi_and_then<A, B, R, V, F, G>(bf: F, g: G) -> impl Fn(A, B) -> V + Send + Sync
where
    F: Fn(A, B) -> R + Send + Sync,
    G: Fn(R) -> V + Send + Sync,
{
    move |a, b| g(bf(a, b))
}

// =============================================================================
// PREDICATES
// =============================================================================

/// Boolean algebra on predicates.
///
/// Both operands of `and`/`or` are evaluated lazily: the right-hand side
/// only runs when the left-hand side does not decide the result.
pub trait PredicateExt<T: ?Sized>: Fn(&T) -> bool + Send + Sync + Sized {
    /// Holds when both predicates hold.
    fn and<P>(self, other: P) -> impl Fn(&T) -> bool + Send + Sync
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        move |x: &T| self(x) && other(x)
    }

    /// Holds when either predicate holds.
    fn or<P>(self, other: P) -> impl Fn(&T) -> bool + Send + Sync
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        move |x: &T| self(x) || other(x)
    }

    /// Holds when this predicate does not.
    fn negate(self) -> impl Fn(&T) -> bool + Send + Sync {
        move |x: &T| !self(x)
    }
}

impl<T: ?Sized, F> PredicateExt<T> for F where F: Fn(&T) -> bool + Send + Sync {}

/// Predicate that holds for values equal to `value`.
pub fn is_equal<T>(value: T) -> impl Fn(&T) -> bool + Send + Sync
where
    T: PartialEq + Send + Sync,
{
    move |x: &T| *x == value
}

/// Negation of `predicate`, usable where a method call would not read well.
pub fn not<T: ?Sized, P>(predicate: P) -> impl Fn(&T) -> bool + Send + Sync
where
    P: Fn(&T) -> bool + Send + Sync,
{
    predicate.negate()
}

// =============================================================================
// CONSUMERS
// =============================================================================

/// Run `first`, then `second`, on each value.
pub fn consumer_and_then<T: ?Sized, F, G>(mut first: F, mut second: G) -> impl FnMut(&T) + Send
where
    F: FnMut(&T) + Send,
    G: FnMut(&T) + Send,
{
    move |x: &T| {
        first(x);
        second(x);
    }
}

/// Two-argument form of [`consumer_and_then`].
pub fn bi_consumer_and_then<A: ?Sized, B: ?Sized, F, G>(
    mut first: F,
    mut second: G,
) -> impl FnMut(&A, &B) + Send
where
    F: FnMut(&A, &B) + Send,
    G: FnMut(&A, &B) + Send,
{
    move |a: &A, b: &B| {
        first(a, b);
        second(a, b);
    }
}

// =============================================================================
// ORDERING
// =============================================================================

/// Binary operator returning the smaller argument; the first wins ties.
pub fn min_by<T, C>(compare: C) -> impl Fn(T, T) -> T + Send + Sync
where
    C: Fn(&T, &T) -> Ordering + Send + Sync,
{
    move |a, b| if compare(&b, &a) == Ordering::Less { b } else { a }
}

/// Binary operator returning the larger argument; the second wins ties.
pub fn max_by<T, C>(compare: C) -> impl Fn(T, T) -> T + Send + Sync
where
    C: Fn(&T, &T) -> Ordering + Send + Sync,
{
    move |a, b| if compare(&b, &a) == Ordering::Less { a } else { b }
}

/// Comparator ordering values by an extracted key.
pub fn comparing<T: ?Sized, K, F>(key: F) -> impl Fn(&T, &T) -> Ordering + Send + Sync
where
    K: Ord,
    F: Fn(&T) -> K + Send + Sync,
{
    move |a: &T, b: &T| key(a).cmp(&key(b))
}

/// The reverse of `compare`.
pub fn reversed<T: ?Sized, C>(compare: C) -> impl Fn(&T, &T) -> Ordering + Send + Sync
where
    C: Fn(&T, &T) -> Ordering + Send + Sync,
{
    move |a: &T, b: &T| compare(b, a)
}

/// `compare`, falling back to `next` for ties.
pub fn then_comparing<T: ?Sized, C, D>(compare: C, next: D) -> impl Fn(&T, &T) -> Ordering + Send + Sync
where
    C: Fn(&T, &T) -> Ordering + Send + Sync,
    D: Fn(&T, &T) -> Ordering + Send + Sync,
{
    move |a: &T, b: &T| compare(a, b).then_with(|| next(a, b))
}

// =============================================================================
// TESTS
// =============================================================================
