//! Registry — redb-backed persistence for TaskGrid.
//!
//! Provides typed CRUD operations over VM resources, tasks, and assignment
//! records. All values are JSON-serialized into redb's `&[u8]` value
//! columns. The store supports both on-disk and in-memory backends (the
//! latter for testing).
//!
//! Creation rejects duplicate ids; deletion cascades to assignment records
//! referencing the deleted id but never reconciles the load of other
//! entities. Point updates are atomic per record; there is no multi-record
//! isolation across separate calls.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe registry backed by redb.
#[derive(Clone)]
pub struct Registry {
    db: Arc<Database>,
}

impl Registry {
    /// Open (or create) a persistent registry at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "registry opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory registry (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory registry opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(RESOURCES).map_err(map_err!(Table))?;
        txn.open_table(TASKS).map_err(map_err!(Table))?;
        txn.open_table(ASSIGNMENTS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Resources ──────────────────────────────────────────────────

    /// Create a VM resource with zero load. Rejects a duplicate id.
    pub fn create_resource(&self, spec: &VmSpec) -> StateResult<VmRecord> {
        let record = VmRecord::new(spec);
        let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
            let exists = table.get(record.id.as_str()).map_err(map_err!(Read))?.is_some();
            if exists {
                return Err(StateError::Duplicate(record.id.clone()));
            }
            table
                .insert(record.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(vm = %record.id, "resource created");
        Ok(record)
    }

    /// Get a VM resource by id.
    pub fn get_resource(&self, vm_id: &str) -> StateResult<Option<VmRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
        match table.get(vm_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: VmRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List all VM resources in key order. This iteration order is the
    /// snapshot order scheduling passes observe.
    pub fn list_resources(&self) -> StateResult<Vec<VmRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: VmRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }

    /// Overwrite a VM's load and status in one atomic record update.
    pub fn update_resource_load(
        &self,
        vm_id: &str,
        current_load: u32,
        status: VmStatus,
    ) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
            let mut record: VmRecord = {
                let guard = table
                    .get(vm_id)
                    .map_err(map_err!(Read))?
                    .ok_or_else(|| StateError::NotFound(vm_id.to_string()))?;
                serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
            };
            record.current_load = current_load;
            record.status = status;
            let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            table
                .insert(vm_id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(vm = %vm_id, load = current_load, ?status, "resource load updated");
        Ok(())
    }

    /// Delete a VM resource and cascade-delete assignment records that
    /// reference it. Returns true if the primary record existed. Tasks
    /// running on the VM are left untouched.
    pub fn delete_resource(&self, vm_id: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
            existed = table.remove(vm_id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        let cascaded = self.delete_assignments_for_vm(vm_id)?;
        debug!(vm = %vm_id, existed, cascaded, "resource deleted");
        Ok(existed)
    }

    // ── Tasks ──────────────────────────────────────────────────────

    /// Create a pending task. Rejects a duplicate id.
    pub fn create_task(&self, spec: &TaskSpec) -> StateResult<TaskRecord> {
        let record = TaskRecord::new(spec);
        let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(TASKS).map_err(map_err!(Table))?;
            let exists = table.get(record.id.as_str()).map_err(map_err!(Read))?.is_some();
            if exists {
                return Err(StateError::Duplicate(record.id.clone()));
            }
            table
                .insert(record.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(task = %record.id, "task created");
        Ok(record)
    }

    /// Get a task by id.
    pub fn get_task(&self, task_id: &str) -> StateResult<Option<TaskRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(TASKS).map_err(map_err!(Table))?;
        match table.get(task_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: TaskRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List all tasks in key order.
    pub fn list_tasks(&self) -> StateResult<Vec<TaskRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(TASKS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: TaskRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }

    /// List tasks with status `pending`, in key order.
    pub fn list_pending_tasks(&self) -> StateResult<Vec<TaskRecord>> {
        let all = self.list_tasks()?;
        Ok(all
            .into_iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .collect())
    }

    /// Overwrite a task's status in one atomic record update. When
    /// `assigned_vm_id` is `Some`, the assignment is recorded as well;
    /// `None` leaves any existing assignment in place.
    pub fn update_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        assigned_vm_id: Option<&str>,
    ) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(TASKS).map_err(map_err!(Table))?;
            let mut record: TaskRecord = {
                let guard = table
                    .get(task_id)
                    .map_err(map_err!(Read))?
                    .ok_or_else(|| StateError::NotFound(task_id.to_string()))?;
                serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
            };
            record.status = status;
            if let Some(vm_id) = assigned_vm_id {
                record.assigned_vm_id = Some(vm_id.to_string());
            }
            let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            table
                .insert(task_id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(task = %task_id, ?status, "task status updated");
        Ok(())
    }

    /// Delete a task and cascade-delete assignment records that reference
    /// it. Returns true if the primary record existed. The VM it may have
    /// been running on keeps its load; only completion releases capacity.
    pub fn delete_task(&self, task_id: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(TASKS).map_err(map_err!(Table))?;
            existed = table.remove(task_id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        let cascaded = self.delete_assignments_for_task(task_id)?;
        debug!(task = %task_id, existed, cascaded, "task deleted");
        Ok(existed)
    }

    // ── Assignments ────────────────────────────────────────────────

    /// Insert or update an assignment-tracking record.
    pub fn put_assignment(&self, assignment: &AssignmentRecord) -> StateResult<()> {
        let key = assignment.table_key();
        let value = serde_json::to_vec(assignment).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(ASSIGNMENTS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// List all assignment records.
    pub fn list_assignments(&self) -> StateResult<Vec<AssignmentRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ASSIGNMENTS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: AssignmentRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }

    /// Delete all assignments for a task (key prefix scan). Returns the
    /// number deleted.
    pub fn delete_assignments_for_task(&self, task_id: &str) -> StateResult<u32> {
        let prefix = format!("{task_id}:");
        self.delete_assignments_where(|key, _| key.starts_with(&prefix))
    }

    /// Delete all assignments referencing a VM. Returns the number
    /// deleted.
    pub fn delete_assignments_for_vm(&self, vm_id: &str) -> StateResult<u32> {
        self.delete_assignments_where(|_, record| record.vm_id == vm_id)
    }

    fn delete_assignments_where(
        &self,
        matches: impl Fn(&str, &AssignmentRecord) -> bool,
    ) -> StateResult<u32> {
        // Collect keys in a read transaction first.
        let keys: Vec<String> = {
            let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
            let table = txn.open_table(ASSIGNMENTS).map_err(map_err!(Table))?;
            table
                .iter()
                .map_err(map_err!(Read))?
                .filter_map(|entry| {
                    let (key, value) = entry.ok()?;
                    let record: AssignmentRecord = serde_json::from_slice(value.value()).ok()?;
                    let k = key.value().to_string();
                    matches(&k, &record).then_some(k)
                })
                .collect()
        };
        // Delete in a write transaction.
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let count = keys.len() as u32;
        {
            let mut table = txn.open_table(ASSIGNMENTS).map_err(map_err!(Table))?;
            for key in &keys {
                table.remove(key.as_str()).map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(count)
    }
}
