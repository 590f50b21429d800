//! # Catalogue Tier Tests (T0-T5)
//!
//! The behavioural catalogue, run against the sample roster.
//!
//! ## Tiers
//! - T0: Sources
//! - T1: Intermediate Stages
//! - T2: Terminals
//! - T3: Collectors
//! - T4: Parallel Evaluation
//! - T5: Optional Results

use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use streamline_core::collector::{self, Joiner, MergePolicy};
use streamline_core::function::{comparing, reversed, then_comparing};
use streamline_core::{Employee, OptionalExt, Roster, StreamError, source};

fn salary(amount: i64) -> Decimal {
    Decimal::from(amount)
}

// =============================================================================
// TIER T0: SOURCES
// =============================================================================

mod t0_sources {
    use super::*;

    /// T0.1: A roster streams its employees in roster order.
    #[test]
    fn roster_streams_in_order() {
        let names: Vec<String> = Roster::sample().stream().map(|e| e.name).limit(3).to_vec();
        assert_eq!(names, vec!["Zhang San", "Li Si", "Wang Wu"]);
    }

    /// T0.2: Builders and concatenation feed distinct.
    #[test]
    fn builder_concat_distinct() {
        let list = vec![1, 2, 1, 3, 1, 4];
        let added = source::Builder::new().add(4).add(5).build();
        let out = source::concat(source::of(list), added).distinct().to_vec();
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    /// T0.3: Infinite sources are usable once bounded.
    #[test]
    fn bounded_infinite_sources() {
        let squares = source::iterate(1.0_f64, |n| (n + 1.0).powi(2)).limit(3).to_vec();
        assert_eq!(squares, vec![1.0, 4.0, 25.0]);

        let rolls = source::random_ints(2024, 1, 7).expect("valid range").limit(10).count();
        assert_eq!(rolls, 10);
    }
}

// =============================================================================
// TIER T1: INTERMEDIATE STAGES
// =============================================================================

mod t1_intermediate {
    use super::*;

    /// T1.1: flat_map flattens nested lists in order.
    #[test]
    fn flat_map_flattens() {
        let nested = vec![vec![1], vec![2, 3, 4], vec![5]];
        let out = source::of(nested).flat_map(|inner| inner).to_vec();
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    /// T1.2: Filtering by age keeps roster order.
    #[test]
    fn filter_under_fifty() {
        let young = Roster::sample().stream().filter(|e| e.age < 50).count();
        assert_eq!(young, 5);
    }

    /// T1.3: skip drops a prefix.
    #[test]
    fn skip_prefix() {
        let out = source::range(0, 8).skip(3).to_vec();
        assert_eq!(out, vec![3, 4, 5, 6, 7]);
    }

    /// T1.4: Age descending, then salary descending, then name.
    #[test]
    fn multi_key_sort() {
        let order = then_comparing(
            then_comparing(
                reversed(comparing(|e: &Employee| e.age)),
                reversed(comparing(|e: &Employee| e.salary)),
            ),
            comparing(|e: &Employee| e.name.clone()),
        );
        let sorted: Vec<(u32, Decimal)> = Roster::sample()
            .stream()
            .sorted_by(order)
            .map(|e| (e.age, e.salary))
            .limit(3)
            .to_vec();
        assert_eq!(sorted, vec![(55, salary(8000)), (50, salary(7000)), (50, salary(6000))]);
    }

    /// T1.5: peek sees only the elements a limit lets through.
    #[test]
    fn peek_is_bounded_by_limit() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let out = source::iterate(1_i64, |n| n * 10)
            .peek(move |n| sink.lock().expect("lock").push(*n))
            .limit(3)
            .to_vec();
        assert_eq!(out, vec![1, 10, 100]);
        assert_eq!(*seen.lock().expect("lock"), vec![1, 10, 100]);
    }
}

// =============================================================================
// TIER T2: TERMINALS
// =============================================================================

mod t2_terminals {
    use super::*;

    /// T2.1: Matching terminals.
    #[test]
    fn matching() {
        let roster = Roster::sample();
        assert!(roster.stream().any_match(|e| e.age > 50));
        assert!(roster.stream().all_match(|e| e.salary >= salary(1000)));
        assert!(roster.stream().none_match(|e| e.name.is_empty()));
    }

    /// T2.2: Extremes by key.
    #[test]
    fn extremes() {
        let roster = Roster::sample();
        let youngest = roster.stream().min_by_key(|e| e.age).expect("non-empty");
        assert_eq!(youngest.name, "Zhang San");

        let top = roster.stream().map(|e| e.salary).max();
        assert_eq!(top, Some(salary(8000)));
    }

    /// T2.3: Reduction and numeric terminals.
    #[test]
    fn reduction() {
        let roster = Roster::sample();
        let total = roster.stream().map(|e| e.salary).reduce_with(Decimal::ZERO, |a, b| a + b);
        assert_eq!(total, salary(36000));

        let ages = roster.stream().map_to_i64(|e| i64::from(e.age));
        let stats = ages.summary_statistics();
        assert_eq!(stats.count(), 8);
        assert_eq!(stats.min(), Some(16));
        assert_eq!(stats.max(), Some(55));

        let avg = roster.stream().map_to_f64(|e| e.salary_f64()).average();
        assert_eq!(avg, Some(4500.0));
    }

    /// T2.4: A pipeline converts into a plain iterator.
    #[test]
    fn into_iterator() {
        let mut names = Roster::sample().stream().map(|e| e.name).into_iter();
        assert_eq!(names.next().as_deref(), Some("Zhang San"));
        assert_eq!(names.count(), 7);
    }
}

// =============================================================================
// TIER T3: COLLECTORS
// =============================================================================

mod t3_collectors {
    use super::*;

    /// T3.1: Joining names with a wrapped joiner.
    #[test]
    fn joining_names() {
        let joined = Roster::sample()
            .stream()
            .map(|e| e.name)
            .limit(2)
            .collect(collector::joining(Joiner::wrapped(", ", "[", "]")));
        assert_eq!(joined, "[Zhang San, Li Si]");
    }

    /// T3.2: Name collisions under each merge policy.
    #[test]
    fn name_to_salary_map() {
        let roster = Roster::sample();
        let rejected = roster.stream().collect(collector::to_map(
            |e: &Employee| e.name.clone(),
            |e: Employee| e.salary,
            MergePolicy::Reject,
        ));
        assert!(matches!(rejected, Err(StreamError::DuplicateKey(_))));

        let summed = roster
            .stream()
            .collect(collector::to_map(
                |e: &Employee| e.name.clone(),
                |e: Employee| e.salary,
                MergePolicy::merge(|a, b| a + b),
            ))
            .expect("merge never rejects");
        assert_eq!(summed["Li Jiu"], salary(15000));
    }

    /// T3.3: Grouping by age band with counting downstream.
    #[test]
    fn grouping_by_band() {
        let bands = Roster::sample().stream().collect(collector::grouping_by_ordered(
            |e: &Employee| e.age / 10 * 10,
            collector::counting(),
        ));
        let pairs: Vec<(u32, u64)> = bands.into_iter().collect();
        assert_eq!(pairs, vec![(10, 2), (20, 1), (30, 2), (50, 3)]);
    }

    /// T3.4: Partitioning with a summing downstream.
    #[test]
    fn partition_payroll() {
        let split = Roster::sample().stream().collect(collector::partitioning_by_with(
            |e: &Employee| e.age >= 30,
            collector::summing_decimal(|e: &Employee| e.salary),
        ));
        assert_eq!(split.matching, salary(30000));
        assert_eq!(split.rejected, salary(6000));
    }

    /// T3.5: Nested adapters.
    #[test]
    fn nested_adapters() {
        let oldest_per_name = Roster::sample().stream().collect(collector::grouping_by_with(
            |e: &Employee| e.name.clone(),
            collector::collecting_and_then(
                collector::max_by(|a: &Employee, b: &Employee| a.age.cmp(&b.age)),
                |oldest: Option<Employee>| oldest.map(|e| e.age),
            ),
        ));
        assert_eq!(oldest_per_name["Li Jiu"], Some(55));
    }
}

// =============================================================================
// TIER T4: PARALLEL EVALUATION
// =============================================================================

mod t4_parallel {
    use super::*;

    /// T4.1: Ordered terminals agree across modes.
    #[test]
    fn ordered_results_agree() {
        let roster = Roster::sample();
        let seq = roster.stream().map(|e| e.name).to_vec();
        let par = roster.par_stream().map(|e| e.name).to_vec();
        assert_eq!(seq, par);
    }

    /// T4.2: for_each_ordered keeps encounter order under parallel mode.
    #[test]
    fn for_each_ordered() {
        let mut out = Vec::new();
        source::of(vec![5, 1, 2, 6, 3, 7, 4])
            .parallel()
            .for_each_ordered(|x| out.push(x));
        assert_eq!(out, vec![5, 1, 2, 6, 3, 7, 4]);
    }

    /// T4.3: for_each visits every element under parallel mode.
    #[test]
    fn for_each_visits_all() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        source::of(vec![5, 1, 2, 6, 3, 7, 4])
            .unordered()
            .parallel()
            .for_each(move |x| sink.lock().expect("lock").push(x));
        let mut seen = seen.lock().expect("lock").clone();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    /// T4.4: The last mode switch wins.
    #[test]
    fn last_switch_wins() {
        let roster = Roster::sample();
        assert!(!roster.par_stream().filter(|e| e.age > 20).sequential().is_parallel());
        assert!(roster.stream().parallel().map(|e| e.age).is_parallel());
    }

    /// T4.5: Parallel fold with a separate combiner.
    #[test]
    fn parallel_fold() {
        let letters = Roster::sample()
            .par_stream()
            .fold(0_usize, |acc, e| acc + e.name.len(), |a, b| a + b);
        let expected: usize = Roster::sample().employees().iter().map(|e| e.name.len()).sum();
        assert_eq!(letters, expected);
    }
}

// =============================================================================
// TIER T5: OPTIONAL RESULTS
// =============================================================================

mod t5_optional {
    use super::*;
    use streamline_core::optional::{inverse, square_root};

    /// T5.1: Empty pipeline results fail explicitly.
    #[test]
    fn empty_result_fails() {
        let result = Roster::sample().stream().filter(|e| e.age > 100).find_first().get_or_fail();
        assert_eq!(result.map(|e| e.age), Err(StreamError::NoValuePresent));
    }

    /// T5.2: Partial helpers chain with and_then.
    #[test]
    fn chained_helpers() {
        assert_eq!(inverse(4.0).and_then(square_root).unwrap_or(0.0), 0.5);
        assert_eq!(inverse(0.0).and_then(square_root).unwrap_or(0.0), 0.0);
    }
}
