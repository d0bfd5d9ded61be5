//! redb table definitions for the TaskGrid registry.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain
//! types). Assignment records use the composite key `{task_id}:{vm_id}`.

use redb::TableDefinition;

/// VM resource records keyed by `{vm_id}`.
pub const RESOURCES: TableDefinition<&str, &[u8]> = TableDefinition::new("resources");

/// Task records keyed by `{task_id}`.
pub const TASKS: TableDefinition<&str, &[u8]> = TableDefinition::new("tasks");

/// Assignment-tracking records keyed by `{task_id}:{vm_id}`.
pub const ASSIGNMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("assignments");
