//! # Pipeline Module
//!
//! Lazy stages and terminal evaluation.
//!
//! A [`Pipeline<S, T>`] owns a source of `S` values and one fused stage
//! closure that turns each `S` into zero or more `T` values. Element-wise
//! stages (`map`, `filter`, `flat_map`, `peek`) extend that closure; no
//! closure runs until a terminal operation consumes the pipeline.
//!
//! Stateful stages (`distinct`, `sorted*`) and order-dependent slicing
//! stages (`limit`, `skip`, `take_while`, `drop_while`) are barriers: they
//! wrap the upstream pipeline in a deferred source that is only evaluated
//! when the downstream terminal starts pulling.
//!
//! ## Evaluation Modes
//!
//! - `Sequential`: the calling thread pulls elements one at a time.
//! - `Parallel`: the fused stage and the terminal run on the rayon pool.
//!   Terminals that must see every element drain the source first.
//!   Short-circuiting terminals (`any_match`, `all_match`, `none_match`,
//!   `find_first`, `find_any`) and plain iteration pull the source in
//!   growing chunks and stop at the first chunk that settles the result,
//!   so they finish on infinite sources.
//!
//! The mode is shared by every stage of one pipeline chain, so the last
//! `parallel()`/`sequential()` call before the terminal decides how the
//! whole chain runs. Slicing barriers always pull their upstream in
//! encounter order on the calling thread.

use crate::collector::{self, Collector};
use crate::stats::{FloatSummary, IntSummary};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

/// Boxed, sendable iterator used as the source of every pipeline.
pub type BoxIter<T> = Box<dyn Iterator<Item = T> + Send + 'static>;

/// Fused element-wise stage: pushes the outputs for one input into a sink.
type StageFn<S, T> = Arc<dyn Fn(S, &mut dyn FnMut(T)) + Send + Sync>;

/// A pipeline whose source and output element types coincide.
pub type Stream<T> = Pipeline<T, T>;

// =============================================================================
// MODES
// =============================================================================

/// How a pipeline's stages and terminal are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecMode {
    /// One element at a time on the calling thread.
    #[default]
    Sequential,
    /// Stages and terminal run across the rayon worker pool.
    Parallel,
}

/// Whether results must respect the source's encounter order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Encounter {
    /// Order-sensitive terminals and barriers keep source order.
    #[default]
    Ordered,
    /// Callers do not care about order; parallel barriers may reorder.
    Unordered,
}

/// Mode flags shared by every stage of one pipeline chain.
#[derive(Debug, Default)]
struct Flags {
    parallel: AtomicBool,
    unordered: AtomicBool,
}

// =============================================================================
// DEFERRED SOURCE
// =============================================================================

/// Source that builds its inner iterator on the first pull.
struct Deferred<T> {
    thunk: Option<Box<dyn FnOnce() -> BoxIter<T> + Send>>,
    inner: Option<BoxIter<T>>,
}

impl<T> Deferred<T> {
    fn new(thunk: impl FnOnce() -> BoxIter<T> + Send + 'static) -> Self {
        Self {
            thunk: Some(Box::new(thunk)),
            inner: None,
        }
    }
}

impl<T> Iterator for Deferred<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if let Some(thunk) = self.thunk.take() {
            self.inner = Some(thunk());
        }
        self.inner.as_mut()?.next()
    }
}

// =============================================================================
// CHUNKED PULLS
// =============================================================================

/// Size of the first chunk pulled by a short-circuiting parallel terminal.
const FIRST_CHUNK: usize = 256;

/// Chunks stop doubling at this size.
const MAX_CHUNK: usize = 1 << 16;

/// Pulls a source in chunks that double in size up to [`MAX_CHUNK`].
struct Chunks<S> {
    source: BoxIter<S>,
    len: usize,
}

impl<S> Chunks<S> {
    fn new(source: BoxIter<S>) -> Self {
        Self {
            source,
            len: FIRST_CHUNK,
        }
    }
}

impl<S> Iterator for Chunks<S> {
    type Item = Vec<S>;

    fn next(&mut self) -> Option<Vec<S>> {
        let chunk: Vec<S> = self.source.by_ref().take(self.len).collect();
        self.len = (self.len * 2).min(MAX_CHUNK);
        (!chunk.is_empty()).then_some(chunk)
    }
}

/// Run the fused stage over one chunk on the rayon pool.
fn par_chunk<S, T>(stage: &StageFn<S, T>, chunk: Vec<S>) -> impl ParallelIterator<Item = T>
where
    S: Send,
    T: Send,
{
    chunk
        .into_par_iter()
        .flat_map_iter(move |item| run_stage(stage, item))
}

// =============================================================================
// PIPELINE
// =============================================================================

/// A lazily evaluated, single-use sequence transformation.
///
/// Every terminal operation takes `self`, so a pipeline cannot be
/// evaluated twice.
pub struct Pipeline<S, T> {
    source: BoxIter<S>,
    stage: StageFn<S, T>,
    flags: Arc<Flags>,
}

impl<S, T> fmt::Debug for Pipeline<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("parallel", &self.flags.parallel.load(AtomicOrdering::Relaxed))
            .field("unordered", &self.flags.unordered.load(AtomicOrdering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Pipeline<T, T> {
    /// Wrap an iterator as a sequential, ordered stream.
    pub fn from_source(source: BoxIter<T>) -> Self {
        Self {
            source,
            stage: Arc::new(|item, sink: &mut dyn FnMut(T)| sink(item)),
            flags: Arc::new(Flags::default()),
        }
    }
}

/// Run the fused stage for one input and buffer its outputs.
fn run_stage<S, T>(stage: &StageFn<S, T>, item: S) -> Vec<T> {
    let mut out = Vec::new();
    stage(item, &mut |t| out.push(t));
    out
}

/// Append `next` to `prev`, producing a new fused stage.
fn chain<S, T, U>(
    prev: StageFn<S, T>,
    next: impl Fn(T, &mut dyn FnMut(U)) + Send + Sync + 'static,
) -> StageFn<S, U>
where
    S: 'static,
    T: 'static,
    U: 'static,
{
    Arc::new(move |item: S, sink: &mut dyn FnMut(U)| {
        prev(item, &mut |t: T| next(t, &mut *sink));
    })
}

impl<S, T> Pipeline<S, T>
where
    S: Send + 'static,
    T: Send + 'static,
{
    // -------------------------------------------------------------------------
    // MODE SWITCHES
    // -------------------------------------------------------------------------

    /// Mark the whole chain for parallel evaluation.
    #[must_use]
    pub fn parallel(self) -> Self {
        self.with_mode(ExecMode::Parallel)
    }

    /// Mark the whole chain for sequential evaluation.
    #[must_use]
    pub fn sequential(self) -> Self {
        self.with_mode(ExecMode::Sequential)
    }

    /// Set the evaluation mode explicitly.
    #[must_use]
    pub fn with_mode(self, mode: ExecMode) -> Self {
        self.flags
            .parallel
            .store(mode == ExecMode::Parallel, AtomicOrdering::Relaxed);
        self
    }

    /// Drop the encounter-order constraint.
    #[must_use]
    pub fn unordered(self) -> Self {
        self.flags.unordered.store(true, AtomicOrdering::Relaxed);
        self
    }

    /// Current evaluation mode.
    pub fn mode(&self) -> ExecMode {
        if self.flags.parallel.load(AtomicOrdering::Relaxed) {
            ExecMode::Parallel
        } else {
            ExecMode::Sequential
        }
    }

    /// Current encounter-order constraint.
    pub fn encounter(&self) -> Encounter {
        if self.flags.unordered.load(AtomicOrdering::Relaxed) {
            Encounter::Unordered
        } else {
            Encounter::Ordered
        }
    }

    /// Check if the chain is marked parallel.
    pub fn is_parallel(&self) -> bool {
        self.mode() == ExecMode::Parallel
    }

    // -------------------------------------------------------------------------
    // ELEMENT-WISE STAGES
    // -------------------------------------------------------------------------

    fn extend<U: Send + 'static>(
        self,
        next: impl Fn(T, &mut dyn FnMut(U)) + Send + Sync + 'static,
    ) -> Pipeline<S, U> {
        Pipeline {
            source: self.source,
            stage: chain(self.stage, next),
            flags: self.flags,
        }
    }

    /// Transform each element.
    pub fn map<U, F>(self, f: F) -> Pipeline<S, U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.extend(move |t, sink| sink(f(t)))
    }

    /// Keep only elements matching `predicate`.
    #[must_use]
    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.extend(move |t, sink| {
            if predicate(&t) {
                sink(t);
            }
        })
    }

    /// Replace each element with the contents of the iterable `f` returns.
    pub fn flat_map<U, I, F>(self, f: F) -> Pipeline<S, U>
    where
        U: Send + 'static,
        I: IntoIterator<Item = U>,
        F: Fn(T) -> I + Send + Sync + 'static,
    {
        self.extend(move |t, sink| {
            for u in f(t) {
                sink(u);
            }
        })
    }

    /// Observe each element as it passes, without changing it.
    #[must_use]
    pub fn peek<A>(self, action: A) -> Self
    where
        A: Fn(&T) + Send + Sync + 'static,
    {
        self.extend(move |t, sink| {
            action(&t);
            sink(t);
        })
    }

    /// Map to an integer pipeline.
    pub fn map_to_i64<F>(self, f: F) -> Pipeline<S, i64>
    where
        F: Fn(T) -> i64 + Send + Sync + 'static,
    {
        self.map(f)
    }

    /// Map to a float pipeline.
    pub fn map_to_f64<F>(self, f: F) -> Pipeline<S, f64>
    where
        F: Fn(T) -> f64 + Send + Sync + 'static,
    {
        self.map(f)
    }

    // -------------------------------------------------------------------------
    // BARRIERS
    // -------------------------------------------------------------------------

    /// Start a new chain whose source is produced by `build` on first pull.
    ///
    /// The new chain shares this chain's mode flags.
    fn rebase<U: Send + 'static>(
        self,
        build: impl FnOnce(Self) -> BoxIter<U> + Send + 'static,
    ) -> Stream<U> {
        let flags = Arc::clone(&self.flags);
        Pipeline {
            source: Box::new(Deferred::new(move || build(self))),
            stage: Arc::new(|item, sink: &mut dyn FnMut(U)| sink(item)),
            flags,
        }
    }

    /// Remove duplicates, keeping the first occurrence.
    ///
    /// Under parallel + unordered evaluation the surviving elements come
    /// out in unspecified order.
    pub fn distinct(self) -> Stream<T>
    where
        T: Eq + Hash + Clone,
    {
        self.rebase(|upstream| {
            let iter: BoxIter<T> = match (upstream.mode(), upstream.encounter()) {
                (ExecMode::Parallel, Encounter::Unordered) => {
                    let unique: HashSet<T> = upstream.par_items().collect();
                    Box::new(unique.into_iter())
                }
                (ExecMode::Parallel, Encounter::Ordered) => {
                    let mut seen = HashSet::new();
                    let items: Vec<T> = upstream
                        .par_items()
                        .collect::<Vec<T>>()
                        .into_iter()
                        .filter(|t| seen.insert(t.clone()))
                        .collect();
                    Box::new(items.into_iter())
                }
                (ExecMode::Sequential, _) => {
                    let mut seen = HashSet::new();
                    Box::new(
                        upstream
                            .into_seq_iter()
                            .filter(move |t| seen.insert(t.clone())),
                    )
                }
            };
            iter
        })
    }

    /// Sort by natural order. Stable.
    pub fn sorted(self) -> Stream<T>
    where
        T: Ord,
    {
        self.rebase(|upstream| {
            let parallel = upstream.is_parallel();
            let mut items = upstream.evaluate();
            if parallel {
                items.par_sort();
            } else {
                items.sort();
            }
            Box::new(items.into_iter())
        })
    }

    /// Sort with a comparator. Stable.
    pub fn sorted_by<C>(self, compare: C) -> Stream<T>
    where
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.rebase(move |upstream| {
            let parallel = upstream.is_parallel();
            let mut items = upstream.evaluate();
            if parallel {
                items.par_sort_by(|a, b| compare(a, b));
            } else {
                items.sort_by(|a, b| compare(a, b));
            }
            Box::new(items.into_iter())
        })
    }

    /// Sort by a derived key. Stable.
    pub fn sorted_by_key<K, F>(self, key: F) -> Stream<T>
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.sorted_by(move |a, b| key(a).cmp(&key(b)))
    }

    /// Keep at most the first `max` elements.
    ///
    /// Safe on infinite sources: the upstream is pulled in encounter order
    /// and pulling stops once `max` elements have been produced.
    pub fn limit(self, max: usize) -> Stream<T> {
        self.rebase(move |upstream| Box::new(upstream.into_seq_iter().take(max)))
    }

    /// Discard the first `n` elements.
    pub fn skip(self, n: usize) -> Stream<T> {
        self.rebase(move |upstream| Box::new(upstream.into_seq_iter().skip(n)))
    }

    /// Keep elements while `predicate` holds, stopping at the first failure.
    pub fn take_while<P>(self, predicate: P) -> Stream<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.rebase(move |upstream| {
            Box::new(upstream.into_seq_iter().take_while(move |t| predicate(t)))
        })
    }

    /// Discard elements while `predicate` holds, then keep the rest.
    pub fn drop_while<P>(self, predicate: P) -> Stream<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.rebase(move |upstream| {
            Box::new(upstream.into_seq_iter().skip_while(move |t| predicate(t)))
        })
    }

    // -------------------------------------------------------------------------
    // EVALUATION HELPERS
    // -------------------------------------------------------------------------

    /// Lazy, encounter-ordered iterator on the calling thread.
    pub(crate) fn into_seq_iter(self) -> BoxIter<T> {
        let stage = self.stage;
        Box::new(self.source.flat_map(move |item| run_stage(&stage, item)))
    }

    /// Drain the source, then run the fused stage on the rayon pool.
    fn par_items(self) -> impl ParallelIterator<Item = T> {
        let items: Vec<S> = self.source.collect();
        let stage = self.stage;
        items
            .into_par_iter()
            .flat_map_iter(move |item| run_stage(&stage, item))
    }

    /// Search chunk by chunk; `search` runs each chunk on the rayon pool.
    ///
    /// Stops pulling the source at the first chunk for which `search`
    /// yields a result.
    fn par_search<R>(
        self,
        mut search: impl FnMut(&StageFn<S, T>, Vec<S>) -> Option<R>,
    ) -> Option<R> {
        let stage = self.stage;
        Chunks::new(self.source).find_map(|chunk| search(&stage, chunk))
    }

    /// Evaluate in the current mode into an encounter-ordered vector.
    fn evaluate(self) -> Vec<T> {
        if self.is_parallel() {
            self.par_items().collect()
        } else {
            self.into_seq_iter().collect()
        }
    }

    /// Iterator that evaluates in the current mode once pulled.
    ///
    /// Sequential chains stay lazy element by element. Parallel chains run
    /// one source chunk at a time on the rayon pool, in encounter order.
    pub(crate) fn into_lazy_iter(self) -> BoxIter<T> {
        if self.is_parallel() {
            let stage = self.stage;
            Box::new(
                Chunks::new(self.source)
                    .flat_map(move |chunk| par_chunk(&stage, chunk).collect::<Vec<T>>()),
            )
        } else {
            self.into_seq_iter()
        }
    }

    // -------------------------------------------------------------------------
    // TERMINALS
    // -------------------------------------------------------------------------

    /// Apply `action` to every element.
    ///
    /// Under parallel evaluation the order of calls is unspecified.
    pub fn for_each<A>(self, action: A)
    where
        A: Fn(T) + Send + Sync,
    {
        if self.is_parallel() {
            self.par_items().for_each(action);
        } else {
            self.into_seq_iter().for_each(action);
        }
    }

    /// Apply `action` to every element in encounter order.
    ///
    /// Under parallel evaluation the stages still run on the worker pool;
    /// only the action is applied in order on the calling thread.
    pub fn for_each_ordered<A>(self, action: A)
    where
        A: FnMut(T),
    {
        self.into_lazy_iter().for_each(action);
    }

    /// Accumulate every element with `collector`.
    ///
    /// The collector's `combine` step runs only under parallel evaluation.
    pub fn collect<C>(self, collector: C) -> C::Output
    where
        C: Collector<T>,
    {
        if self.is_parallel() {
            let acc = self
                .par_items()
                .fold(
                    || collector.supply(),
                    |mut acc, item| {
                        collector.accumulate(&mut acc, item);
                        acc
                    },
                )
                .reduce(|| collector.supply(), |left, right| collector.combine(left, right));
            collector.finish(acc)
        } else {
            let mut acc = collector.supply();
            for item in self.into_seq_iter() {
                collector.accumulate(&mut acc, item);
            }
            collector.finish(acc)
        }
    }

    /// Collect into a vector in encounter order.
    pub fn to_vec(self) -> Vec<T> {
        self.evaluate()
    }

    /// Combine all elements with `op`; `None` when empty.
    pub fn reduce<F>(self, op: F) -> Option<T>
    where
        F: Fn(T, T) -> T + Send + Sync,
    {
        if self.is_parallel() {
            self.par_items().reduce_with(op)
        } else {
            self.into_seq_iter().reduce(op)
        }
    }

    /// Combine all elements with `op`, starting from `identity`.
    ///
    /// `identity` must be an identity of `op`: under parallel evaluation it
    /// seeds every partial result.
    pub fn reduce_with<F>(self, identity: T, op: F) -> T
    where
        T: Clone + Sync,
        F: Fn(T, T) -> T + Send + Sync,
    {
        if self.is_parallel() {
            self.par_items().reduce(|| identity.clone(), op)
        } else {
            self.into_seq_iter().fold(identity, op)
        }
    }

    /// Fold into a different type.
    ///
    /// `combine` merges per-worker partial results and is only called under
    /// parallel evaluation.
    pub fn fold<U, A, C>(self, identity: U, accumulate: A, combine: C) -> U
    where
        U: Clone + Send + Sync,
        A: Fn(U, T) -> U + Send + Sync,
        C: Fn(U, U) -> U + Send + Sync,
    {
        if self.is_parallel() {
            self.par_items()
                .fold(|| identity.clone(), accumulate)
                .reduce(|| identity.clone(), combine)
        } else {
            self.into_seq_iter().fold(identity, accumulate)
        }
    }

    /// Number of elements.
    pub fn count(self) -> usize {
        if self.is_parallel() {
            self.par_items().count()
        } else {
            self.into_seq_iter().count()
        }
    }

    /// Smallest element by `compare`.
    pub fn min_by<C>(self, compare: C) -> Option<T>
    where
        C: Fn(&T, &T) -> Ordering + Send + Sync,
    {
        if self.is_parallel() {
            self.par_items().min_by(compare)
        } else {
            self.into_seq_iter().min_by(compare)
        }
    }

    /// Largest element by `compare`.
    pub fn max_by<C>(self, compare: C) -> Option<T>
    where
        C: Fn(&T, &T) -> Ordering + Send + Sync,
    {
        if self.is_parallel() {
            self.par_items().max_by(compare)
        } else {
            self.into_seq_iter().max_by(compare)
        }
    }

    /// Element with the smallest key.
    pub fn min_by_key<K, F>(self, key: F) -> Option<T>
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync,
    {
        self.min_by(|a, b| key(a).cmp(&key(b)))
    }

    /// Element with the largest key.
    pub fn max_by_key<K, F>(self, key: F) -> Option<T>
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync,
    {
        self.max_by(|a, b| key(a).cmp(&key(b)))
    }

    /// Smallest element by natural order.
    pub fn min(self) -> Option<T>
    where
        T: Ord,
    {
        self.min_by(T::cmp)
    }

    /// Largest element by natural order.
    pub fn max(self) -> Option<T>
    where
        T: Ord,
    {
        self.max_by(T::cmp)
    }

    /// Whether any element matches. Short-circuits.
    pub fn any_match<P>(self, predicate: P) -> bool
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        if self.is_parallel() {
            self.par_search(|stage, chunk| {
                par_chunk(stage, chunk)
                    .any(|t| predicate(&t))
                    .then_some(())
            })
            .is_some()
        } else {
            self.into_seq_iter().any(|t| predicate(&t))
        }
    }

    /// Whether every element matches; `true` when empty. Short-circuits.
    pub fn all_match<P>(self, predicate: P) -> bool
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        if self.is_parallel() {
            !self.any_match(move |t: &T| !predicate(t))
        } else {
            self.into_seq_iter().all(|t| predicate(&t))
        }
    }

    /// Whether no element matches; `true` when empty. Short-circuits.
    pub fn none_match<P>(self, predicate: P) -> bool
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        !self.any_match(predicate)
    }

    /// First element in encounter order.
    ///
    /// On an unordered parallel chain this behaves like [`Pipeline::find_any`].
    pub fn find_first(self) -> Option<T> {
        match (self.mode(), self.encounter()) {
            (ExecMode::Parallel, Encounter::Ordered) => {
                self.par_search(|stage, chunk| par_chunk(stage, chunk).find_first(|_| true))
            }
            (ExecMode::Parallel, Encounter::Unordered) => self.find_any(),
            (ExecMode::Sequential, _) => self.into_seq_iter().next(),
        }
    }

    /// Any element; whichever worker finds one first under parallel mode.
    pub fn find_any(self) -> Option<T> {
        if self.is_parallel() {
            self.par_search(|stage, chunk| par_chunk(stage, chunk).find_any(|_| true))
        } else {
            self.into_seq_iter().next()
        }
    }
}

impl<S, T> IntoIterator for Pipeline<S, T>
where
    S: Send + 'static,
    T: Send + 'static,
{
    type Item = T;
    type IntoIter = BoxIter<T>;

    /// Consume the pipeline as a plain iterator.
    fn into_iter(self) -> Self::IntoIter {
        self.into_lazy_iter()
    }
}

// =============================================================================
// NUMERIC TERMINALS
// =============================================================================

impl<S: Send + 'static> Pipeline<S, i64> {
    /// Wrapping sum; `0` when empty.
    pub fn sum(self) -> i64 {
        self.summary_statistics().sum()
    }

    /// Arithmetic mean; `None` when empty.
    pub fn average(self) -> Option<f64> {
        self.summary_statistics().average()
    }

    /// Count, sum, min, max and average in one pass.
    pub fn summary_statistics(self) -> IntSummary {
        self.collect(collector::summarizing_i64(|value: &i64| *value))
    }
}

impl<S: Send + 'static> Pipeline<S, f64> {
    /// Sum; `0.0` when empty.
    pub fn sum(self) -> f64 {
        self.summary_statistics().sum()
    }

    /// Arithmetic mean; `None` when empty.
    pub fn average(self) -> Option<f64> {
        self.summary_statistics().average()
    }

    /// Count, sum, min, max and average in one pass.
    pub fn summary_statistics(self) -> FloatSummary {
        self.collect(collector::summarizing_f64(|value: &f64| *value))
    }
}

// =============================================================================
// TESTS
// =============================================================================
