//! Recommendation engine
//!
//! Properties flow one way: the [`properties::PropertyStore`] holds what the
//! application ran with, the cluster shape and memory plan size the executors,
//! and the ordered [`rules::pipeline`] writes into a [`ledger::Ledger`] that is
//! finalized into [`ledger::Recommendations`].

pub mod combine;
pub mod context;
pub mod definitions;
pub mod engine;
pub mod entry;
pub mod ledger;
pub mod memory;
pub mod properties;
pub mod rules;
pub mod tool;
pub mod units;
pub mod version;

pub use combine::combine;
pub use engine::{AutoTuner, AutoTunerBuilder, TunerBuild};
pub use entry::{Resolution, TuningEntry, FILL_IN_VALUE};
pub use ledger::{KeyPolicy, OutputFilter, Recommendations};
pub use tool::ToolKind;
