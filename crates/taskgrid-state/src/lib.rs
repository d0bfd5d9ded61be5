//! taskgrid-state — embedded registry for TaskGrid.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for VM resources, tasks, and assignment-tracking records.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns,
//! keyed by their unique identifiers (`{vm_id}`, `{task_id}`,
//! `{task_id}:{vm_id}` for assignments). Every operation runs in its own
//! transaction, so each record mutation is atomic on its own; callers that
//! read a record and write it back later get no isolation across the pair.
//!
//! The `Registry` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::Registry;
pub use types::*;
