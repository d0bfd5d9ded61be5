//! Domain types for the TaskGrid registry.
//!
//! These types represent the persisted state of VM resources, tasks, and
//! assignment-tracking records. All types are serializable to/from JSON
//! for storage in redb tables. Enum spellings on the wire (`available`,
//! `pending`, `vip`, ...) are part of the external contract and must not
//! change.

use serde::{Deserialize, Serialize};

/// Unique identifier for a VM resource.
pub type VmId = String;

/// Unique identifier for a task.
pub type TaskId = String;

// ── VM resource ────────────────────────────────────────────────────

/// Creation request for a VM resource. Capacity fields are immutable
/// after creation; `current_load` and `status` are registry-derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VmSpec {
    pub id: VmId,
    /// CPU capacity in cores.
    pub cpu_cores: u32,
    /// RAM capacity in megabytes.
    pub ram_mb: u64,
    /// Storage capacity in gigabytes.
    pub storage_gb: u64,
    /// Energy cost rate, informational only.
    #[serde(default)]
    pub energy_rate: f64,
}

/// Persisted state of a VM resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VmRecord {
    pub id: VmId,
    pub cpu_cores: u32,
    pub ram_mb: u64,
    pub storage_gb: u64,
    pub energy_rate: f64,
    /// Sum of `cpu_required` across tasks assigned here and not yet
    /// completed.
    pub current_load: u32,
    pub status: VmStatus,
}

impl VmRecord {
    /// Build a fresh record from a creation request: zero load, available.
    pub fn new(spec: &VmSpec) -> Self {
        Self {
            id: spec.id.clone(),
            cpu_cores: spec.cpu_cores,
            ram_mb: spec.ram_mb,
            storage_gb: spec.storage_gb,
            energy_rate: spec.energy_rate,
            current_load: 0,
            status: VmStatus::Available,
        }
    }
}

/// Load-derived status of a VM. Never stored independently of a load
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmStatus {
    /// `current_load == 0`.
    Available,
    /// `0 < current_load < cpu_cores`.
    Busy,
    /// `current_load >= cpu_cores`.
    Full,
}

// ── Task ──────────────────────────────────────────────────────────

/// Creation request for a task. Requirement fields are immutable after
/// creation; `status` and `assigned_vm_id` are engine-managed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSpec {
    pub id: TaskId,
    /// CPU cores this task reserves while running.
    pub cpu_required: u32,
    /// RAM requirement in megabytes.
    pub ram_required_mb: u64,
    /// Disk requirement in megabytes.
    pub disk_storage_mb: u64,
    #[serde(default)]
    pub user_type: UserType,
    /// Estimated run time, consumed only by the policy heuristic.
    #[serde(default = "default_time_required")]
    pub time_required_sec: u32,
}

fn default_time_required() -> u32 {
    10
}

/// Persisted state of a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub id: TaskId,
    pub cpu_required: u32,
    pub ram_required_mb: u64,
    pub disk_storage_mb: u64,
    pub user_type: UserType,
    pub time_required_sec: u32,
    pub status: TaskStatus,
    /// Set exactly when the task transitions to `running`; cleared only
    /// by deletion of the task.
    pub assigned_vm_id: Option<VmId>,
}

impl TaskRecord {
    /// Build a fresh record from a creation request: pending, unassigned.
    pub fn new(spec: &TaskSpec) -> Self {
        Self {
            id: spec.id.clone(),
            cpu_required: spec.cpu_required,
            ram_required_mb: spec.ram_required_mb,
            disk_storage_mb: spec.disk_storage_mb,
            user_type: spec.user_type,
            time_required_sec: spec.time_required_sec,
            status: TaskStatus::Pending,
            assigned_vm_id: None,
        }
    }
}

/// Lifecycle status of a task. Transitions are monotonic:
/// `pending → running → completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
}

/// Submitting user's tier, consumed by the priority ordering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    #[default]
    Regular,
    Premium,
    Vip,
}

impl UserType {
    /// Fixed ordering rank: vip > premium > regular.
    pub fn priority_rank(self) -> u8 {
        match self {
            UserType::Vip => 3,
            UserType::Premium => 2,
            UserType::Regular => 1,
        }
    }
}

// ── Assignment ────────────────────────────────────────────────────

/// Tracking record written when a task is placed on a VM. Cascade-deleted
/// with either endpoint; never consulted by the decision logic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentRecord {
    pub task_id: TaskId,
    pub vm_id: VmId,
    /// Unix timestamp (seconds) of the placement.
    pub assigned_at: u64,
}

impl AssignmentRecord {
    /// Build the composite key for the assignments table.
    pub fn table_key(&self) -> String {
        format!("{}:{}", self.task_id, self.vm_id)
    }
}
