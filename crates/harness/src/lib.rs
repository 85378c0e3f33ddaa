//! FileGuard access simulation harness
//!
//! Drives an [`AccessControl`](fileguard_access::AccessControl) contract and a
//! [`ContentStore`](fileguard_content::ContentStore) through repeated
//! authorized and unauthorized reads plus a tamper check, and reports the
//! outcome as a metrics artifact.

pub mod config;
pub mod context;
pub mod errors;
pub mod metrics;
pub mod report;
pub mod simulation;

pub use config::{ContentBackend, LedgerBackend, LogFormat, SimulationConfig};
pub use context::{Participants, SimulationContext};
pub use errors::{Result, SimulationError};
pub use metrics::{
    AccessAttempt, AttemptOutcome, LatencyRecorder, LatencySummary, Metrics, MetricsCollector,
};
pub use report::{read_metrics, write_metrics};
pub use simulation::{AccessSimulation, SimulationPlan};
