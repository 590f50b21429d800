//! # Source Module
//!
//! Constructors for sequential, ordered streams.
//!
//! Every source produces a [`Stream`] in `Sequential` mode; call
//! [`Pipeline::parallel`] to switch. Infinite sources (`generate`,
//! `iterate`, the random generators) are safe as long as a slicing stage
//! such as `limit` or `take_while` bounds them before a terminal.

use crate::pipeline::{BoxIter, Pipeline, Stream};
use crate::types::StreamError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

fn boxed<T, I>(iter: I) -> Stream<T>
where
    T: Send + 'static,
    I: Iterator<Item = T> + Send + 'static,
{
    let source: BoxIter<T> = Box::new(iter);
    Pipeline::from_source(source)
}

// =============================================================================
// COLLECTIONS
// =============================================================================

/// Stream the elements of `items` in order.
pub fn of<T: Send + 'static>(items: Vec<T>) -> Stream<T> {
    boxed(items.into_iter())
}

/// Stream whatever `iter` yields.
pub fn from_iter<I>(iter: I) -> Stream<I::Item>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    boxed(iter.into_iter())
}

/// A stream with no elements.
pub fn empty<T: Send + 'static>() -> Stream<T> {
    boxed(std::iter::empty())
}

/// Stream clones of `items[start..end]`.
///
/// Bounds are clamped to the slice, so an out-of-range `end` stops at the
/// last element and `start > end` gives an empty stream.
pub fn slice<T: Clone + Send + 'static>(items: &[T], start: usize, end: usize) -> Stream<T> {
    let end = end.min(items.len());
    let start = start.min(end);
    of(items[start..end].to_vec())
}

/// Incrementally assembled stream.
#[derive(Debug, Clone)]
pub struct Builder<T> {
    items: Vec<T>,
}

impl<T> Default for Builder<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Send + 'static> Builder<T> {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one element.
    #[must_use]
    pub fn add(mut self, item: T) -> Self {
        self.items.push(item);
        self
    }

    /// Append every element of `items`.
    #[must_use]
    pub fn extend(mut self, items: impl IntoIterator<Item = T>) -> Self {
        self.items.extend(items);
        self
    }

    /// Finish building. The elements stream in insertion order.
    #[must_use]
    pub fn build(self) -> Stream<T> {
        of(self.items)
    }
}

// =============================================================================
// GENERATORS
// =============================================================================

/// Infinite stream of values produced by `supplier`.
pub fn generate<T, F>(supplier: F) -> Stream<T>
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    boxed(std::iter::repeat_with(supplier))
}

/// Infinite stream `seed, f(seed), f(f(seed)), ...`.
///
/// The successor of an element is computed when that element is pulled.
pub fn iterate<T, F>(seed: T, mut f: F) -> Stream<T>
where
    T: Send + 'static,
    F: FnMut(&T) -> T + Send + 'static,
{
    boxed(std::iter::successors(Some(seed), move |prev| Some(f(prev))))
}

/// Like [`iterate`], ending before the first element failing `has_next`.
pub fn iterate_while<T, P, F>(seed: T, mut has_next: P, mut next: F) -> Stream<T>
where
    T: Send + 'static,
    P: FnMut(&T) -> bool + Send + 'static,
    F: FnMut(&T) -> T + Send + 'static,
{
    boxed(
        std::iter::successors(Some(seed), move |prev| Some(next(prev)))
            .take_while(move |item| has_next(item)),
    )
}

/// Integers in `[start, end)`.
pub fn range(start: i64, end: i64) -> Stream<i64> {
    boxed(start..end)
}

/// Integers in `[start, end]`.
pub fn range_closed(start: i64, end: i64) -> Stream<i64> {
    boxed(start..=end)
}

/// Infinite seeded integers uniformly drawn from `[lower, upper)`.
///
/// The same seed always produces the same sequence.
pub fn random_ints(seed: u64, lower: i64, upper: i64) -> Result<Stream<i64>, StreamError> {
    if lower >= upper {
        return Err(StreamError::InvalidRange(format!(
            "lower bound {} must be below upper bound {}",
            lower, upper
        )));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Ok(generate(move || rng.gen_range(lower..upper)))
}

/// Infinite seeded floats in `[0, 1)`.
pub fn random_f64s(seed: u64) -> Stream<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    generate(move || rng.r#gen::<f64>())
}

// =============================================================================
// TEXT
// =============================================================================

/// The `char`s of `text`.
pub fn chars(text: &str) -> Stream<char> {
    of(text.chars().collect())
}

/// The Unicode scalar values of `text`.
pub fn code_points(text: &str) -> Stream<u32> {
    of(text.chars().map(u32::from).collect())
}

/// Tokens of `text` between matches of `pattern`. Empty tokens are dropped.
pub fn split_pattern(pattern: &str, text: &str) -> Result<Stream<String>, StreamError> {
    let regex = Regex::new(pattern).map_err(|e| StreamError::InvalidPattern(e.to_string()))?;
    let tokens: Vec<String> = regex
        .split(text)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect();
    Ok(of(tokens))
}

/// Lines of the file at `path`, read lazily.
///
/// Opening the file is eager so a missing file is reported here. A read
/// error later on ends the stream and is logged.
pub fn lines(path: &Path) -> Result<Stream<String>, StreamError> {
    let file = File::open(path).map_err(|e| {
        StreamError::IoError(format!("Cannot open '{}': {}", path.display(), e))
    })?;
    tracing::debug!(path = %path.display(), "Opened line source");

    let label = path.display().to_string();
    let lines = BufReader::new(file)
        .lines()
        .map_while(move |line| match line {
            Ok(line) => Some(line),
            Err(e) => {
                tracing::warn!(path = %label, error = %e, "Line source stopped on read error");
                None
            }
        })
        .fuse();
    Ok(boxed(lines))
}

// =============================================================================
// COMBINATION
// =============================================================================

/// All elements of `first`, then all elements of `second`.
///
/// Each input is evaluated in its own mode. The result is parallel when
/// either input was.
pub fn concat<A, B, T>(first: Pipeline<A, T>, second: Pipeline<B, T>) -> Stream<T>
where
    A: Send + 'static,
    B: Send + 'static,
    T: Send + 'static,
{
    let parallel = first.is_parallel() || second.is_parallel();
    let joined = boxed(first.into_lazy_iter().chain(second.into_lazy_iter()));
    if parallel { joined.parallel() } else { joined }
}

// =============================================================================
// TESTS
// =============================================================================
