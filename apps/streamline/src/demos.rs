//! # Demo Catalogue
//!
//! Named pipelines over a roster. Each demo runs in the requested
//! [`ExecMode`] and returns its result as a JSON value, so the CLI can print
//! it as text or JSON and tests can compare modes.

use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use streamline_core::collector::{self, Joiner, MergePolicy};
use streamline_core::function::{comparing, reversed, then_comparing};
use streamline_core::optional::{inverse, square_root};
use streamline_core::{Employee, ExecMode, OptionalExt, PredicateExt, Roster, StreamError, source};

/// Signature shared by every demo.
type DemoFn = fn(&Roster, ExecMode) -> Result<Value, StreamError>;

/// One catalogue entry.
#[derive(Debug, Clone, Copy)]
pub struct Demo {
    pub name: &'static str,
    pub summary: &'static str,
    run: DemoFn,
}

impl Demo {
    /// Run the demo against `roster`.
    pub fn run(&self, roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
        tracing::debug!(demo = self.name, ?mode, employees = roster.len(), "Running demo");
        (self.run)(roster, mode)
    }
}

const CATALOGUE: &[Demo] = &[
    Demo { name: "filter", summary: "Employees younger than 50", run: filter },
    Demo { name: "map", summary: "Upper-cased names", run: map },
    Demo { name: "flat-map", summary: "Every word of every name", run: flat_map },
    Demo { name: "distinct", summary: "Names without repeats", run: distinct },
    Demo { name: "sorted", summary: "Age desc, then salary desc, then name", run: sorted },
    Demo { name: "slice", summary: "skip(2) then limit(3)", run: slice },
    Demo { name: "peek", summary: "Peek at a bounded infinite sequence", run: peek },
    Demo { name: "match", summary: "any/all/none matching", run: matching },
    Demo { name: "reduce", summary: "Payroll via reduce and fold", run: reduce },
    Demo { name: "statistics", summary: "Age and salary summaries", run: statistics },
    Demo { name: "joining", summary: "Names joined three ways", run: joining },
    Demo { name: "to-map", summary: "Name to salary under each merge policy", run: to_map },
    Demo { name: "grouping", summary: "Employees grouped by age band", run: grouping },
    Demo { name: "partitioning", summary: "Salary above 5000 or not", run: partitioning },
    Demo { name: "optional", summary: "Absent results and partial arithmetic", run: optional },
    Demo { name: "text", summary: "Pattern split and code points", run: text },
    Demo { name: "random", summary: "Seeded dice rolls", run: random },
];

/// Every registered demo, in catalogue order.
pub fn catalogue() -> &'static [Demo] {
    CATALOGUE
}

/// Look up a demo by name.
pub fn find(name: &str) -> Option<&'static Demo> {
    CATALOGUE.iter().find(|demo| demo.name == name)
}

// =============================================================================
// INTERMEDIATE STAGES
// =============================================================================

fn filter(roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let young: Vec<String> = roster
        .stream()
        .with_mode(mode)
        .filter(|e| e.age < 50)
        .map(|e| e.name)
        .to_vec();
    Ok(json!({ "younger_than_50": young }))
}

fn map(roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let upper = roster.stream().with_mode(mode).map(|e| e.name.to_uppercase()).to_vec();
    Ok(json!({ "names": upper }))
}

fn flat_map(roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let words = roster
        .stream()
        .with_mode(mode)
        .flat_map(|e| e.name.split_whitespace().map(str::to_owned).collect::<Vec<_>>())
        .to_vec();
    Ok(json!({ "words": words }))
}

fn distinct(roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let names = roster.stream().with_mode(mode).map(|e| e.name).distinct().to_vec();
    Ok(json!({ "count": names.len(), "names": names }))
}

fn sorted(roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let order = then_comparing(
        then_comparing(
            reversed(comparing(|e: &Employee| e.age)),
            reversed(comparing(|e: &Employee| e.salary)),
        ),
        comparing(|e: &Employee| e.name.clone()),
    );
    let employees = roster.stream().with_mode(mode).sorted_by(order).to_vec();
    Ok(json!({ "employees": employees }))
}

fn slice(roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let window = roster
        .stream()
        .with_mode(mode)
        .skip(2)
        .limit(3)
        .map(|e| e.name)
        .to_vec();
    Ok(json!({ "window": window }))
}

fn peek(_roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let peeked = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&peeked);
    let values = source::iterate(1.0_f64, |n| (n + 1.0).powi(2))
        .peek(move |n| {
            if let Ok(mut seen) = sink.lock() {
                seen.push(*n);
            }
        })
        .limit(3)
        .with_mode(mode)
        .to_vec();
    let peeked = peeked.lock().map(|seen| seen.clone()).unwrap_or_default();
    Ok(json!({ "values": values, "peeked": peeked }))
}

// =============================================================================
// TERMINALS
// =============================================================================

fn matching(roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let adult = |e: &Employee| e.age >= 18;
    let senior = |e: &Employee| e.age >= 50;
    Ok(json!({
        "any_over_50": roster.stream().with_mode(mode).any_match(|e| e.age > 50),
        "all_adults": roster.stream().with_mode(mode).all_match(adult),
        "none_unpaid": roster.stream().with_mode(mode).none_match(|e| e.salary <= Decimal::ZERO),
        "adult_non_seniors": roster.stream().with_mode(mode).filter(adult.and(senior.negate())).count(),
    }))
}

fn reduce(roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let payroll = roster
        .stream()
        .with_mode(mode)
        .map(|e| e.salary)
        .reduce(|a, b| a + b)
        .unwrap_or(Decimal::ZERO);
    let name_chars = roster
        .stream()
        .with_mode(mode)
        .fold(0_usize, |acc, e| acc + e.name.chars().count(), |a, b| a + b);
    Ok(json!({ "payroll": payroll, "name_chars": name_chars }))
}

fn statistics(roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let ages = roster
        .stream()
        .with_mode(mode)
        .map_to_i64(|e| i64::from(e.age))
        .summary_statistics();
    let salaries = roster
        .stream()
        .with_mode(mode)
        .map_to_f64(|e| e.salary_f64())
        .summary_statistics();
    Ok(json!({ "age": ages, "salary": salaries, "average_age": ages.average() }))
}

// =============================================================================
// COLLECTORS
// =============================================================================

fn joining(roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let names = || roster.stream().with_mode(mode).map(|e| e.name);
    Ok(json!({
        "plain": names().collect(collector::joining(Joiner::plain())),
        "delimited": names().collect(collector::joining(Joiner::delimited(", "))),
        "wrapped": names().collect(collector::joining(Joiner::wrapped(", ", "{", "}"))),
    }))
}

fn to_map(roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let by_name = |policy: MergePolicy<Decimal>| {
        roster.stream().with_mode(mode).collect(collector::to_btree_map(
            |e: &Employee| e.name.clone(),
            |e: Employee| e.salary,
            policy,
        ))
    };

    let rejected = match by_name(MergePolicy::Reject) {
        Ok(map) => json!(map),
        Err(e) => json!(e.to_string()),
    };
    let keep_existing = by_name(MergePolicy::KeepExisting)?;
    let keep_latest = by_name(MergePolicy::KeepLatest)?;
    let merge_sum = by_name(MergePolicy::merge(|a, b| a + b))?;
    Ok(json!({
        "reject": rejected,
        "keep_existing": keep_existing,
        "keep_latest": keep_latest,
        "merge_sum": merge_sum,
    }))
}

fn grouping(roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let stream = || roster.stream().with_mode(mode);
    let by_band = stream().collect(collector::grouping_by_ordered(
        |e: &Employee| format!("{}s", e.age / 10 * 10),
        collector::mapping(|e: Employee| e.name, collector::to_list()),
    ));
    let count_by_age = stream().collect(collector::grouping_by_ordered(
        |e: &Employee| e.age,
        collector::counting(),
    ));
    let oldest_per_name = stream().collect(collector::grouping_by_ordered(
        |e: &Employee| e.name.clone(),
        collector::collecting_and_then(
            collector::max_by(|a: &Employee, b: &Employee| a.age.cmp(&b.age)),
            |oldest: Option<Employee>| oldest.map(|e| e.age),
        ),
    ));
    Ok(json!({
        "names_by_band": by_band,
        "count_by_age": count_by_age,
        "oldest_per_name": oldest_per_name,
    }))
}

fn partitioning(roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let threshold = Decimal::from(5000);
    let split = roster.stream().with_mode(mode).collect(collector::partitioning_by_with(
        move |e: &Employee| e.salary > threshold,
        collector::mapping(|e: Employee| e.name, collector::to_list()),
    ));
    let payroll = roster.stream().with_mode(mode).collect(collector::partitioning_by_with(
        move |e: &Employee| e.salary > threshold,
        collector::summing_decimal(|e: &Employee| e.salary),
    ));
    Ok(json!({ "names": split, "payroll": payroll }))
}

// =============================================================================
// OPTIONAL, TEXT & RANDOM
// =============================================================================

fn optional(roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let centenarian = roster
        .stream()
        .with_mode(mode)
        .filter(|e| e.age >= 100)
        .find_first()
        .get_or_fail()
        .map(|e| e.name)
        .unwrap_or_else(|e| e.to_string());
    let youngest = roster
        .stream()
        .with_mode(mode)
        .min_by_key(|e| e.age)
        .map(|e| e.name)
        .get_or_fail()?;
    Ok(json!({
        "centenarian": centenarian,
        "youngest": youngest,
        "inverse_sqrt_of_4": inverse(4.0).and_then(square_root).unwrap_or(0.0),
        "inverse_sqrt_of_0": inverse(0.0).and_then(square_root).unwrap_or(0.0),
    }))
}

fn text(_roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let sentence = "lazy, composable;  pipelines";
    let tokens = source::split_pattern(r"[,;\s]+", sentence)?.with_mode(mode).to_vec();
    let code_points = source::code_points("Streamline").with_mode(mode).limit(3).to_vec();
    Ok(json!({ "tokens": tokens, "code_points": code_points }))
}

fn random(_roster: &Roster, mode: ExecMode) -> Result<Value, StreamError> {
    let rolls = source::random_ints(2024, 1, 7)?.limit(10).with_mode(mode).to_vec();
    let total = source::of(rolls.clone()).with_mode(mode).sum();
    Ok(json!({ "seed": 2024, "rolls": rolls, "total": total }))
}

// =============================================================================
// TESTS
// =============================================================================
