//! # streamline-core
//!
//! Lazy, composable sequence pipelines for Streamline - THE LIBRARY.
//!
//! A pipeline is built from a source, a chain of lazy intermediate stages
//! and exactly one terminal operation. Nothing runs until the terminal is
//! called, and the terminal consumes the pipeline.
//!
//! ## Layout
//!
//! - `source` → where elements come from (collections, generators, text, files)
//! - `pipeline` → lazy stages, mode switches, terminals
//! - `collector` → accumulation strategies for `collect`
//! - `stats` → mergeable summary statistics
//! - `function` / `optional` → composable function values, recoverable absence
//! - `types` → fixture records and the error type
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: no async, no network dependencies
//! - Sequential and parallel evaluation agree for associative reductions
//! - Collector combiners run only under parallel evaluation
//! - Fixture data is passed in explicitly; there is no global state

// =============================================================================
// MODULES
// =============================================================================

pub mod collector;
pub mod function;
pub mod optional;
pub mod pipeline;
pub mod source;
pub mod stats;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Employee, Roster, StreamError};

// =============================================================================
// RE-EXPORTS: Evaluation Model
// =============================================================================

pub use collector::{Collector, Joiner, MergePolicy, Partition};
pub use function::PredicateExt;
pub use optional::OptionalExt;
pub use pipeline::{BoxIter, Encounter, ExecMode, Pipeline, Stream};
pub use stats::{FloatSummary, IntSummary};
