pub mod error;
pub mod measure;
pub mod plist;
pub mod report;
pub mod runner;
pub mod strategy;
pub mod timer;
pub mod workload;

pub use error::{BenchError, FailureKind};
pub use measure::{Measurement, Operation};
pub use runner::{RunConfig, RunReport, Runner};
pub use strategy::{Strategy, StrategyEntry, StrategyKind};
pub use workload::Workload;
