//! # Collector Module
//!
//! Accumulation strategies for [`Pipeline::collect`](crate::Pipeline::collect).
//!
//! A collector is four functions over a private accumulator:
//! - `supply`: create an empty accumulator (once per worker)
//! - `accumulate`: fold one element into an accumulator
//! - `combine`: merge two partial accumulators (parallel evaluation only)
//! - `finish`: turn the final accumulator into the result
//!
//! `combine(left, right)` always receives the partial result covering the
//! earlier elements as `left`, so order-sensitive collectors (lists,
//! joining, first-wins maps) agree with sequential evaluation.
//!
//! Overload families are split into distinctly named constructors, and
//! the map-conflict strategy is the tagged [`MergePolicy`] parameter.

use crate::stats::{FloatSummary, IntSummary};
use crate::types::StreamError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

// =============================================================================
// COLLECTOR TRAIT
// =============================================================================

/// A strategy for accumulating pipeline elements into a result.
///
/// Collectors must be `Send + Sync`: under parallel evaluation every worker
/// calls `supply` and `accumulate` through a shared reference.
pub trait Collector<T>: Send + Sync {
    /// Mutable accumulation state, one per worker.
    type Acc: Send;
    /// Final result type.
    type Output;

    fn supply(&self) -> Self::Acc;

    fn accumulate(&self, acc: &mut Self::Acc, item: T);

    /// Merge `right` (later elements) into `left` (earlier elements).
    fn combine(&self, left: Self::Acc, right: Self::Acc) -> Self::Acc;

    fn finish(&self, acc: Self::Acc) -> Self::Output;
}

/// Collector assembled from four closures. See [`of`].
pub struct FnCollector<A, S, AF, C, F> {
    supply: S,
    accumulate: AF,
    combine: C,
    finish: F,
    _acc: PhantomData<fn() -> A>,
}

impl<T, A, O, S, AF, C, F> Collector<T> for FnCollector<A, S, AF, C, F>
where
    A: Send,
    S: Fn() -> A + Send + Sync,
    AF: Fn(&mut A, T) + Send + Sync,
    C: Fn(A, A) -> A + Send + Sync,
    F: Fn(A) -> O + Send + Sync,
{
    type Acc = A;
    type Output = O;

    fn supply(&self) -> A {
        (self.supply)()
    }

    fn accumulate(&self, acc: &mut A, item: T) {
        (self.accumulate)(acc, item);
    }

    fn combine(&self, left: A, right: A) -> A {
        (self.combine)(left, right)
    }

    fn finish(&self, acc: A) -> O {
        (self.finish)(acc)
    }
}

/// Build a collector from its four functions.
pub fn of<T, A, O, S, AF, C, F>(
    supply: S,
    accumulate: AF,
    combine: C,
    finish: F,
) -> FnCollector<A, S, AF, C, F>
where
    A: Send,
    S: Fn() -> A + Send + Sync,
    AF: Fn(&mut A, T) + Send + Sync,
    C: Fn(A, A) -> A + Send + Sync,
    F: Fn(A) -> O + Send + Sync,
{
    FnCollector {
        supply,
        accumulate,
        combine,
        finish,
        _acc: PhantomData,
    }
}

// =============================================================================
// CONTAINERS
// =============================================================================

/// Collect into any extendable container, e.g. `BTreeSet`.
pub fn to_collection<T, C>() -> impl Collector<T, Output = C>
where
    C: Default + Extend<T> + IntoIterator<Item = T> + Send,
{
    of(
        C::default,
        |acc: &mut C, item: T| acc.extend(std::iter::once(item)),
        |mut left: C, right: C| {
            left.extend(right);
            left
        },
        |acc: C| acc,
    )
}

/// Collect into a `Vec` in encounter order.
pub fn to_list<T: Send>() -> impl Collector<T, Output = Vec<T>> {
    to_collection::<T, Vec<T>>()
}

/// Collect into a `HashSet`, dropping duplicates.
pub fn to_set<T: Eq + Hash + Send>() -> impl Collector<T, Output = HashSet<T>> {
    to_collection::<T, HashSet<T>>()
}

// =============================================================================
// MAPS
// =============================================================================

/// What a map collector does when two elements produce the same key.
pub enum MergePolicy<V> {
    /// Fail the collection with [`StreamError::DuplicateKey`].
    ///
    /// Sequential evaluation names the first colliding key in encounter
    /// order. Under parallel evaluation the named key is one of the
    /// colliding keys; which one depends on how the input was split.
    Reject,
    /// Keep the value that was inserted first.
    KeepExisting,
    /// Replace with the value that arrived last.
    KeepLatest,
    /// Combine `(existing, incoming)` into one value.
    Merge(Arc<dyn Fn(V, V) -> V + Send + Sync>),
}

impl<V> MergePolicy<V> {
    /// Merge policy from a closure.
    pub fn merge(f: impl Fn(V, V) -> V + Send + Sync + 'static) -> Self {
        Self::Merge(Arc::new(f))
    }

    /// `Ok(value to store)`, or `Err(existing)` when the policy rejects.
    fn resolve(&self, existing: V, incoming: V) -> Result<V, V> {
        match self {
            Self::Reject => Err(existing),
            Self::KeepExisting => Ok(existing),
            Self::KeepLatest => Ok(incoming),
            Self::Merge(f) => Ok(f(existing, incoming)),
        }
    }
}

impl<V> Clone for MergePolicy<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Reject => Self::Reject,
            Self::KeepExisting => Self::KeepExisting,
            Self::KeepLatest => Self::KeepLatest,
            Self::Merge(f) => Self::Merge(Arc::clone(f)),
        }
    }
}

impl<V> Debug for MergePolicy<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reject => f.write_str("Reject"),
            Self::KeepExisting => f.write_str("KeepExisting"),
            Self::KeepLatest => f.write_str("KeepLatest"),
            Self::Merge(_) => f.write_str("Merge(..)"),
        }
    }
}

/// Map types a keyed collector can fill.
pub trait KeyedMap<K, V>: Default + Send + IntoIterator<Item = (K, V)> {
    fn take(&mut self, key: &K) -> Option<V>;
    fn put(&mut self, key: K, value: V);
}

impl<K: Eq + Hash + Send, V: Send> KeyedMap<K, V> for HashMap<K, V> {
    fn take(&mut self, key: &K) -> Option<V> {
        self.remove(key)
    }

    fn put(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K: Ord + Send, V: Send> KeyedMap<K, V> for BTreeMap<K, V> {
    fn take(&mut self, key: &K) -> Option<V> {
        self.remove(key)
    }

    fn put(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

/// Map accumulator that remembers the first rejected key.
struct MapAcc<M> {
    map: M,
    duplicate: Option<String>,
}

impl<M> MapAcc<M> {
    fn new() -> Self
    where
        M: Default,
    {
        Self {
            map: M::default(),
            duplicate: None,
        }
    }

    fn insert<K: Debug, V>(&mut self, key: K, value: V, policy: &MergePolicy<V>)
    where
        M: KeyedMap<K, V>,
    {
        let stored = match self.map.take(&key) {
            None => value,
            Some(existing) => match policy.resolve(existing, value) {
                Ok(merged) => merged,
                Err(existing) => {
                    if self.duplicate.is_none() {
                        self.duplicate = Some(format!("{:?}", key));
                    }
                    existing
                }
            },
        };
        self.map.put(key, stored);
    }
}

fn to_keyed<T, K, V, M, KF, VF>(
    key: KF,
    value: VF,
    policy: MergePolicy<V>,
) -> impl Collector<T, Output = Result<M, StreamError>>
where
    K: Debug,
    V: 'static,
    M: KeyedMap<K, V>,
    KF: Fn(&T) -> K + Send + Sync,
    VF: Fn(T) -> V + Send + Sync,
{
    let merge_policy = policy.clone();
    of(
        MapAcc::<M>::new,
        move |acc: &mut MapAcc<M>, item: T| {
            let k = key(&item);
            acc.insert(k, value(item), &policy);
        },
        move |mut left: MapAcc<M>, right: MapAcc<M>| {
            for (k, v) in right.map {
                left.insert(k, v, &merge_policy);
            }
            left.duplicate = left.duplicate.or(right.duplicate);
            left
        },
        |acc: MapAcc<M>| match acc.duplicate {
            Some(key) => Err(StreamError::DuplicateKey(key)),
            None => Ok(acc.map),
        },
    )
}

/// Collect into a `HashMap`, resolving key collisions with `policy`.
pub fn to_map<T, K, V, KF, VF>(
    key: KF,
    value: VF,
    policy: MergePolicy<V>,
) -> impl Collector<T, Output = Result<HashMap<K, V>, StreamError>>
where
    K: Eq + Hash + Debug + Send,
    V: Send + 'static,
    KF: Fn(&T) -> K + Send + Sync,
    VF: Fn(T) -> V + Send + Sync,
{
    to_keyed::<T, K, V, HashMap<K, V>, KF, VF>(key, value, policy)
}

/// Collect into a `BTreeMap`, resolving key collisions with `policy`.
pub fn to_btree_map<T, K, V, KF, VF>(
    key: KF,
    value: VF,
    policy: MergePolicy<V>,
) -> impl Collector<T, Output = Result<BTreeMap<K, V>, StreamError>>
where
    K: Ord + Debug + Send,
    V: Send + 'static,
    KF: Fn(&T) -> K + Send + Sync,
    VF: Fn(T) -> V + Send + Sync,
{
    to_keyed::<T, K, V, BTreeMap<K, V>, KF, VF>(key, value, policy)
}

// =============================================================================
// AGGREGATES
// =============================================================================

/// Number of elements.
pub fn counting<T>() -> impl Collector<T, Output = u64> {
    of(
        || 0_u64,
        |acc: &mut u64, _item: T| *acc = acc.saturating_add(1),
        u64::saturating_add,
        |acc: u64| acc,
    )
}

/// Sum of an integer property. Wraps on overflow, like [`IntSummary`].
pub fn summing_i64<T, F>(f: F) -> impl Collector<T, Output = i64>
where
    F: Fn(&T) -> i64 + Send + Sync,
{
    of(
        || 0_i64,
        move |acc: &mut i64, item: T| *acc = acc.wrapping_add(f(&item)),
        i64::wrapping_add,
        |acc: i64| acc,
    )
}

/// Sum of a float property.
pub fn summing_f64<T, F>(f: F) -> impl Collector<T, Output = f64>
where
    F: Fn(&T) -> f64 + Send + Sync,
{
    of(
        || 0.0_f64,
        move |acc: &mut f64, item: T| *acc += f(&item),
        |left: f64, right: f64| left + right,
        |acc: f64| acc,
    )
}

/// Exact sum of a decimal property. Saturates at the decimal bounds.
pub fn summing_decimal<T, F>(f: F) -> impl Collector<T, Output = Decimal>
where
    F: Fn(&T) -> Decimal + Send + Sync,
{
    of(
        || Decimal::ZERO,
        move |acc: &mut Decimal, item: T| *acc = acc.saturating_add(f(&item)),
        Decimal::saturating_add,
        |acc: Decimal| acc,
    )
}

/// Statistics over an integer property.
pub fn summarizing_i64<T, F>(f: F) -> impl Collector<T, Output = IntSummary>
where
    F: Fn(&T) -> i64 + Send + Sync,
{
    of(
        IntSummary::new,
        move |acc: &mut IntSummary, item: T| acc.accept(f(&item)),
        IntSummary::combine,
        |acc: IntSummary| acc,
    )
}

/// Statistics over a float property.
pub fn summarizing_f64<T, F>(f: F) -> impl Collector<T, Output = FloatSummary>
where
    F: Fn(&T) -> f64 + Send + Sync,
{
    of(
        FloatSummary::new,
        move |acc: &mut FloatSummary, item: T| acc.accept(f(&item)),
        FloatSummary::combine,
        |acc: FloatSummary| acc,
    )
}

/// Mean of an integer property; `None` for an empty pipeline.
pub fn averaging_i64<T, F>(f: F) -> impl Collector<T, Output = Option<f64>>
where
    F: Fn(&T) -> i64 + Send + Sync,
{
    collecting_and_then(summarizing_i64(f), |summary: IntSummary| summary.average())
}

/// Mean of a float property; `None` for an empty pipeline.
pub fn averaging_f64<T, F>(f: F) -> impl Collector<T, Output = Option<f64>>
where
    F: Fn(&T) -> f64 + Send + Sync,
{
    collecting_and_then(summarizing_f64(f), |summary: FloatSummary| summary.average())
}

// =============================================================================
// JOINING
// =============================================================================

/// Delimiter, prefix and suffix for [`joining`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Joiner {
    pub delimiter: String,
    pub prefix: String,
    pub suffix: String,
}

impl Joiner {
    /// Concatenate with nothing in between.
    #[must_use]
    pub fn plain() -> Self {
        Self::default()
    }

    /// Separate elements with `delimiter`.
    #[must_use]
    pub fn delimited(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
            ..Self::default()
        }
    }

    /// Separate with `delimiter` and wrap the result in `prefix`/`suffix`.
    #[must_use]
    pub fn wrapped(
        delimiter: impl Into<String>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            delimiter: delimiter.into(),
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }
}

/// Join string-like elements. The prefix and suffix are emitted even for
/// an empty pipeline.
pub fn joining<T: AsRef<str>>(joiner: Joiner) -> impl Collector<T, Output = String> {
    of(
        Vec::new,
        |acc: &mut Vec<String>, item: T| acc.push(item.as_ref().to_owned()),
        |mut left: Vec<String>, right: Vec<String>| {
            left.extend(right);
            left
        },
        move |parts: Vec<String>| {
            format!(
                "{}{}{}",
                joiner.prefix,
                parts.join(&joiner.delimiter),
                joiner.suffix
            )
        },
    )
}

// =============================================================================
// EXTREMES & REDUCTION
// =============================================================================

/// Smallest element by `compare`; the earliest wins ties.
pub fn min_by<T, C>(compare: C) -> impl Collector<T, Output = Option<T>>
where
    T: Send,
    C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
{
    let compare = Arc::new(compare);
    let merge = Arc::clone(&compare);
    of(
        || None,
        move |acc: &mut Option<T>, item: T| {
            let replace = acc
                .as_ref()
                .is_none_or(|current| compare(&item, current) == Ordering::Less);
            if replace {
                *acc = Some(item);
            }
        },
        move |left: Option<T>, right: Option<T>| match (left, right) {
            (Some(l), Some(r)) => Some(if merge(&r, &l) == Ordering::Less { r } else { l }),
            (l, None) => l,
            (None, r) => r,
        },
        |acc: Option<T>| acc,
    )
}

/// Largest element by `compare`; the latest wins ties.
pub fn max_by<T, C>(compare: C) -> impl Collector<T, Output = Option<T>>
where
    T: Send,
    C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
{
    let compare = Arc::new(compare);
    let merge = Arc::clone(&compare);
    of(
        || None,
        move |acc: &mut Option<T>, item: T| {
            let replace = acc
                .as_ref()
                .is_none_or(|current| compare(&item, current) != Ordering::Less);
            if replace {
                *acc = Some(item);
            }
        },
        move |left: Option<T>, right: Option<T>| match (left, right) {
            (Some(l), Some(r)) => Some(if merge(&r, &l) == Ordering::Less { l } else { r }),
            (l, None) => l,
            (None, r) => r,
        },
        |acc: Option<T>| acc,
    )
}

/// Fold with `op`; `None` for an empty pipeline.
pub fn reducing<T, F>(op: F) -> impl Collector<T, Output = Option<T>>
where
    T: Send,
    F: Fn(T, T) -> T + Send + Sync + 'static,
{
    let op = Arc::new(op);
    let merge = Arc::clone(&op);
    of(
        || None,
        move |acc: &mut Option<T>, item: T| {
            *acc = Some(match acc.take() {
                Some(current) => op(current, item),
                None => item,
            });
        },
        move |left: Option<T>, right: Option<T>| match (left, right) {
            (Some(l), Some(r)) => Some(merge(l, r)),
            (l, None) => l,
            (None, r) => r,
        },
        |acc: Option<T>| acc,
    )
}

/// Fold with `op` starting from `identity`, which must be an identity of
/// `op` because every worker starts from it.
pub fn reducing_with<T, F>(identity: T, op: F) -> impl Collector<T, Output = T>
where
    T: Clone + Send + Sync,
    F: Fn(T, T) -> T + Send + Sync + 'static,
{
    mapping_reducing(identity, |item: T| item, op)
}

/// Map each element, then fold the mapped values from `identity`.
pub fn mapping_reducing<T, U, M, F>(identity: U, mapper: M, op: F) -> impl Collector<T, Output = U>
where
    U: Clone + Send + Sync,
    M: Fn(T) -> U + Send + Sync,
    F: Fn(U, U) -> U + Send + Sync + 'static,
{
    let op = Arc::new(op);
    let merge = Arc::clone(&op);
    of(
        move || identity.clone(),
        move |acc: &mut U, item: T| *acc = op(acc.clone(), mapper(item)),
        move |left: U, right: U| merge(left, right),
        |acc: U| acc,
    )
}

// =============================================================================
// ADAPTERS
// =============================================================================

/// Map each element before handing it to `downstream`.
pub fn mapping<T, U, M, D>(mapper: M, downstream: D) -> impl Collector<T, Output = D::Output>
where
    M: Fn(T) -> U + Send + Sync,
    D: Collector<U>,
{
    let downstream = Arc::new(downstream);
    let (acc_d, comb_d, fin_d) = (
        Arc::clone(&downstream),
        Arc::clone(&downstream),
        Arc::clone(&downstream),
    );
    of(
        move || downstream.supply(),
        move |acc: &mut D::Acc, item: T| acc_d.accumulate(acc, mapper(item)),
        move |left: D::Acc, right: D::Acc| comb_d.combine(left, right),
        move |acc: D::Acc| fin_d.finish(acc),
    )
}

/// Only hand elements matching `predicate` to `downstream`.
pub fn filtering<T, P, D>(predicate: P, downstream: D) -> impl Collector<T, Output = D::Output>
where
    P: Fn(&T) -> bool + Send + Sync,
    D: Collector<T>,
{
    let downstream = Arc::new(downstream);
    let (acc_d, comb_d, fin_d) = (
        Arc::clone(&downstream),
        Arc::clone(&downstream),
        Arc::clone(&downstream),
    );
    of(
        move || downstream.supply(),
        move |acc: &mut D::Acc, item: T| {
            if predicate(&item) {
                acc_d.accumulate(acc, item);
            }
        },
        move |left: D::Acc, right: D::Acc| comb_d.combine(left, right),
        move |acc: D::Acc| fin_d.finish(acc),
    )
}

/// Apply `finisher` to the result of `downstream`.
pub fn collecting_and_then<T, R, D, F>(downstream: D, finisher: F) -> impl Collector<T, Output = R>
where
    D: Collector<T>,
    F: Fn(D::Output) -> R + Send + Sync,
{
    let downstream = Arc::new(downstream);
    let (acc_d, comb_d, fin_d) = (
        Arc::clone(&downstream),
        Arc::clone(&downstream),
        Arc::clone(&downstream),
    );
    of(
        move || downstream.supply(),
        move |acc: &mut D::Acc, item: T| acc_d.accumulate(acc, item),
        move |left: D::Acc, right: D::Acc| comb_d.combine(left, right),
        move |acc: D::Acc| finisher(fin_d.finish(acc)),
    )
}

// =============================================================================
// GROUPING & PARTITIONING
// =============================================================================

fn grouping_into<T, K, M, CF, D>(
    classifier: CF,
    downstream: D,
) -> impl Collector<T, Output = Vec<(K, D::Output)>>
where
    K: Send,
    M: KeyedMap<K, D::Acc>,
    CF: Fn(&T) -> K + Send + Sync,
    D: Collector<T>,
{
    let downstream = Arc::new(downstream);
    let (comb_d, fin_d) = (Arc::clone(&downstream), Arc::clone(&downstream));
    of(
        M::default,
        move |groups: &mut M, item: T| {
            let key = classifier(&item);
            let mut acc = groups.take(&key).unwrap_or_else(|| downstream.supply());
            downstream.accumulate(&mut acc, item);
            groups.put(key, acc);
        },
        move |mut left: M, right: M| {
            for (key, acc) in right {
                let merged = match left.take(&key) {
                    Some(existing) => comb_d.combine(existing, acc),
                    None => acc,
                };
                left.put(key, merged);
            }
            left
        },
        move |groups: M| {
            groups
                .into_iter()
                .map(|(key, acc)| (key, fin_d.finish(acc)))
                .collect()
        },
    )
}

/// Group elements into lists keyed by `classifier`.
pub fn grouping_by<T, K, CF>(classifier: CF) -> impl Collector<T, Output = HashMap<K, Vec<T>>>
where
    T: Send,
    K: Eq + Hash + Send,
    CF: Fn(&T) -> K + Send + Sync,
{
    grouping_by_with(classifier, to_list())
}

/// Group elements by `classifier`, reducing each group with `downstream`.
pub fn grouping_by_with<T, K, CF, D>(
    classifier: CF,
    downstream: D,
) -> impl Collector<T, Output = HashMap<K, D::Output>>
where
    K: Eq + Hash + Send,
    CF: Fn(&T) -> K + Send + Sync,
    D: Collector<T>,
{
    collecting_and_then(
        grouping_into::<T, K, HashMap<K, D::Acc>, CF, D>(classifier, downstream),
        |pairs: Vec<(K, D::Output)>| pairs.into_iter().collect::<HashMap<_, _>>(),
    )
}

/// Like [`grouping_by_with`], with keys kept in sorted order.
pub fn grouping_by_ordered<T, K, CF, D>(
    classifier: CF,
    downstream: D,
) -> impl Collector<T, Output = BTreeMap<K, D::Output>>
where
    K: Ord + Send,
    CF: Fn(&T) -> K + Send + Sync,
    D: Collector<T>,
{
    collecting_and_then(
        grouping_into::<T, K, BTreeMap<K, D::Acc>, CF, D>(classifier, downstream),
        |pairs: Vec<(K, D::Output)>| pairs.into_iter().collect::<BTreeMap<_, _>>(),
    )
}

/// Result of a partitioning collector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition<V> {
    /// Result for elements where the predicate held.
    pub matching: V,
    /// Result for the other elements.
    pub rejected: V,
}

impl<V> Partition<V> {
    /// Side of the partition for a predicate outcome.
    pub fn get(&self, matched: bool) -> &V {
        if matched { &self.matching } else { &self.rejected }
    }
}

/// Split elements into two lists by `predicate`.
pub fn partitioning_by<T, P>(predicate: P) -> impl Collector<T, Output = Partition<Vec<T>>>
where
    T: Send,
    P: Fn(&T) -> bool + Send + Sync,
{
    partitioning_by_with(predicate, to_list())
}

/// Split elements by `predicate`, reducing each side with `downstream`.
pub fn partitioning_by_with<T, P, D>(
    predicate: P,
    downstream: D,
) -> impl Collector<T, Output = Partition<D::Output>>
where
    P: Fn(&T) -> bool + Send + Sync,
    D: Collector<T>,
{
    let downstream = Arc::new(downstream);
    let (acc_d, comb_d, fin_d) = (
        Arc::clone(&downstream),
        Arc::clone(&downstream),
        Arc::clone(&downstream),
    );
    of(
        move || Partition {
            matching: downstream.supply(),
            rejected: downstream.supply(),
        },
        move |acc: &mut Partition<D::Acc>, item: T| {
            if predicate(&item) {
                acc_d.accumulate(&mut acc.matching, item);
            } else {
                acc_d.accumulate(&mut acc.rejected, item);
            }
        },
        move |left: Partition<D::Acc>, right: Partition<D::Acc>| Partition {
            matching: comb_d.combine(left.matching, right.matching),
            rejected: comb_d.combine(left.rejected, right.rejected),
        },
        move |acc: Partition<D::Acc>| Partition {
            matching: fin_d.finish(acc.matching),
            rejected: fin_d.finish(acc.rejected),
        },
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source;
    use crate::types::{Employee, Roster};
    use std::collections::BTreeSet;

    fn names(employees: &[Employee]) -> Vec<&str> {
        employees.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn to_list_keeps_order_in_both_modes() {
        let seq = source::range(0, 500).collect(to_list());
        let par = source::range(0, 500).parallel().collect(to_list());
        assert_eq!(seq, par);
        assert_eq!(seq.first(), Some(&0));
    }

    #[test]
    fn to_set_and_to_collection() {
        let set = Roster::sample().stream().collect(to_set());
        assert_eq!(set.len(), 7);

        let ages = Roster::sample()
            .stream()
            .map(|e| e.age)
            .collect(to_collection::<_, BTreeSet<u32>>());
        assert_eq!(ages.into_iter().collect::<Vec<_>>(), vec![16, 18, 25, 30, 35, 50, 55]);
    }

    #[test]
    fn to_map_rejects_duplicate_keys() {
        let result = Roster::sample().stream().collect(to_map(
            |e: &Employee| e.name.clone(),
            |e: Employee| e.age,
            MergePolicy::Reject,
        ));
        assert_eq!(result, Err(StreamError::DuplicateKey("\"Li Jiu\"".to_string())));
    }

    #[test]
    fn parallel_reject_names_one_of_the_colliding_keys() {
        let words: Vec<String> = (0..2000).map(|i| format!("w{}", i % 700)).collect();
        let result = source::of(words).parallel().collect(to_map(
            |w: &String| w.clone(),
            |_w: String| (),
            MergePolicy::Reject,
        ));

        let colliding: Vec<String> = (0..700).map(|i| format!("\"w{}\"", i)).collect();
        assert!(matches!(
            result,
            Err(StreamError::DuplicateKey(ref key)) if colliding.contains(key)
        ));
    }

    #[test]
    fn summing_i64_past_the_bound_agrees_across_modes() {
        let mut values = vec![i64::MAX];
        values.extend(std::iter::repeat_n(1, 5000));
        values.extend(std::iter::repeat_n(-1, 5000));

        let sequential = source::of(values.clone()).collect(summing_i64(|v: &i64| *v));
        let parallel = source::of(values).parallel().collect(summing_i64(|v: &i64| *v));
        assert_eq!(sequential, i64::MAX);
        assert_eq!(parallel, i64::MAX);
    }

    #[test]
    fn to_map_merge_policies() {
        let collect_with = |policy: MergePolicy<u32>, parallel: bool| {
            let stream = Roster::sample().stream();
            let stream = if parallel { stream.parallel() } else { stream };
            stream
                .collect(to_btree_map(|e: &Employee| e.name.clone(), |e: Employee| e.age, policy))
                .expect("policy never rejects")
        };

        for parallel in [false, true] {
            let first = collect_with(MergePolicy::KeepExisting, parallel);
            assert_eq!(first.len(), 7);
            assert_eq!(first["Li Jiu"], 50);

            let last = collect_with(MergePolicy::KeepLatest, parallel);
            assert_eq!(last["Li Jiu"], 55);

            let summed = collect_with(MergePolicy::merge(|a, b| a + b), parallel);
            assert_eq!(summed["Li Jiu"], 105);
            assert_eq!(summed["Zhang San"], 16);
        }
    }

    #[test]
    fn counting_and_summing() {
        let roster = Roster::sample();
        assert_eq!(roster.stream().collect(counting()), 8);
        assert_eq!(roster.stream().collect(summing_i64(|e: &Employee| i64::from(e.age))), 279);
        assert_eq!(
            roster.par_stream().collect(summing_decimal(|e: &Employee| e.salary)),
            Decimal::from(36000)
        );
        assert_eq!(roster.stream().collect(summing_f64(|e: &Employee| e.salary_f64())), 36000.0);
    }

    #[test]
    fn averaging_empty_is_none() {
        let avg = source::empty::<Employee>().collect(averaging_i64(|e: &Employee| i64::from(e.age)));
        assert_eq!(avg, None);

        let avg = Roster::sample()
            .stream()
            .collect(averaging_f64(|e: &Employee| e.salary_f64()));
        assert_eq!(avg, Some(4500.0));
    }

    #[test]
    fn summarizing_salaries() {
        let stats = Roster::sample()
            .par_stream()
            .collect(summarizing_f64(|e: &Employee| e.salary_f64()));
        assert_eq!(stats.count(), 8);
        assert_eq!(stats.min(), Some(1000.0));
        assert_eq!(stats.max(), Some(8000.0));

        let ages = Roster::sample()
            .stream()
            .collect(summarizing_i64(|e: &Employee| i64::from(e.age)));
        assert_eq!(ages.sum(), 279);
    }

    #[test]
    fn joining_variants() {
        let words = || source::of(vec!["a", "b", "c"]);
        assert_eq!(words().collect(joining(Joiner::plain())), "abc");
        assert_eq!(words().collect(joining(Joiner::delimited(", "))), "a, b, c");
        assert_eq!(
            words().parallel().collect(joining(Joiner::wrapped("-", "[", "]"))),
            "[a-b-c]"
        );
        assert_eq!(
            source::empty::<String>().collect(joining(Joiner::wrapped(",", "{", "}"))),
            "{}"
        );
    }

    #[test]
    fn min_and_max_by_salary() {
        let roster = Roster::sample();
        let richest = roster
            .stream()
            .collect(max_by(|a: &Employee, b: &Employee| a.salary.cmp(&b.salary)))
            .expect("non-empty");
        assert_eq!(richest.age, 55);

        let poorest = roster
            .par_stream()
            .collect(min_by(|a: &Employee, b: &Employee| a.salary.cmp(&b.salary)))
            .expect("non-empty");
        assert_eq!(poorest.name, "Zhang San");
    }

    #[test]
    fn extreme_ties_follow_position() {
        let by_len = |a: &&str, b: &&str| a.len().cmp(&b.len());
        let words = || source::of(vec!["xx", "a", "yy", "b"]);
        assert_eq!(words().collect(min_by(by_len)), Some("a"));
        assert_eq!(words().collect(max_by(by_len)), Some("yy"));
    }

    #[test]
    fn reducing_family() {
        let ages = || Roster::sample().stream().map(|e| i64::from(e.age));
        assert_eq!(ages().collect(reducing(|a, b| a + b)), Some(279));
        assert_eq!(source::empty::<i64>().collect(reducing(|a, b| a + b)), None);
        assert_eq!(ages().parallel().collect(reducing_with(0, |a, b| a + b)), 279);

        let total = Roster::sample()
            .stream()
            .collect(mapping_reducing(Decimal::ZERO, |e: Employee| e.salary, |a, b| a + b));
        assert_eq!(total, Decimal::from(36000));
    }

    #[test]
    fn adapters_wrap_downstream() {
        let roster = Roster::sample();
        let upper = roster
            .stream()
            .collect(mapping(|e: Employee| e.name.to_uppercase(), joining(Joiner::delimited("|"))));
        assert!(upper.starts_with("ZHANG SAN|LI SI"));

        let seniors = roster
            .stream()
            .collect(filtering(|e: &Employee| e.age >= 50, counting()));
        assert_eq!(seniors, 3);

        let size = roster
            .stream()
            .collect(collecting_and_then(to_list(), |list: Vec<Employee>| list.len()));
        assert_eq!(size, 8);
    }

    #[test]
    fn grouping_by_age() {
        let roster = Roster::sample();
        let groups = roster.par_stream().collect(grouping_by(|e: &Employee| e.age));
        assert_eq!(groups.len(), 7);
        assert_eq!(names(&groups[&50]), vec!["Yang Ba", "Li Jiu"]);

        let counts = roster
            .stream()
            .collect(grouping_by_ordered(|e: &Employee| e.name.clone(), counting()));
        assert_eq!(counts["Li Jiu"], 2);
        assert_eq!(counts.keys().next().map(String::as_str), Some("Feng Qi"));

        let names_by_age = roster.stream().collect(grouping_by_with(
            |e: &Employee| e.age > 30,
            mapping(|e: Employee| e.name, to_list()),
        ));
        assert_eq!(names_by_age[&true].len(), 4);
    }

    #[test]
    fn partitioning_by_salary() {
        let roster = Roster::sample();
        let split = roster
            .stream()
            .collect(partitioning_by(|e: &Employee| e.salary > Decimal::from(5000)));
        assert_eq!(split.get(true).len(), 3);
        assert_eq!(names(split.get(false))[0], "Zhang San");

        let counted = roster.par_stream().collect(partitioning_by_with(
            |e: &Employee| e.age < 18,
            counting(),
        ));
        assert_eq!(counted, Partition { matching: 1, rejected: 7 });
    }

    #[test]
    fn partition_sides_exist_when_empty() {
        let split = source::empty::<i32>().collect(partitioning_by(|x: &i32| *x > 0));
        assert!(split.matching.is_empty());
        assert!(split.rejected.is_empty());
    }
}
