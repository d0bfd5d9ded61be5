//! taskgrid-scheduler — the scheduling engine.
//!
//! Wires registry snapshots through the decision logic in
//! `taskgrid-placement` and commits mutations back to the registry,
//! record by record, after each successful placement.
//!
//! # Architecture
//!
//! ```text
//! Engine
//!   ├── Registry (snapshot VMs + pending tasks, write back results)
//!   └── one pass per schedule() call
//!       ├── policy selection (workload profile → ordering policy)
//!       ├── ordering (stable, per policy)
//!       ├── two-phase first-fit matching per task
//!       └── immediate load accounting after every placement
//! ```
//!
//! A pass owns its snapshot; no engine state survives between passes.

pub mod engine;
pub mod error;

pub use engine::{CompletionOutcome, Engine, EngineConfig, ScheduleOutcome, ScheduledTask};
pub use error::{SchedulerError, SchedulerResult};
