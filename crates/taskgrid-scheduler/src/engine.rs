//! Engine — one scheduling pass at a time over registry snapshots.
//!
//! `schedule()` reads all VMs and all pending tasks once, decides
//! policy and placements against local copies, and writes each placement
//! back immediately (task status, assignment record, VM load). Later
//! tasks in the same pass therefore always match against just-updated
//! loads, never a stale copy of a VM the pass has already touched.
//!
//! Across concurrent passes there is no isolation beyond single-record
//! atomicity in the registry; that weak-consistency bound is accepted.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{debug, info};

use taskgrid_placement::{
    Policy, WorkloadProfile, apply_assignment, find_host, order_tasks, release_assignment,
    select_policy,
};
use taskgrid_state::{AssignmentRecord, Registry, TaskStatus};

use crate::error::{SchedulerError, SchedulerResult};

/// Engine options.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConfig {
    /// Reject completion when the supplied VM does not match the task's
    /// recorded assignment. Off by default: the lenient mode releases
    /// load from whichever VM the caller names.
    pub strict_completion: bool,
}

/// A single placement produced by a pass.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScheduledTask {
    pub task_id: String,
    pub vm_id: String,
    pub time_required_sec: u32,
}

/// Result of a successful scheduling pass. Partial placement is success;
/// unplaced tasks stay pending for the next pass.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleOutcome {
    pub scheduled: Vec<ScheduledTask>,
    pub algorithm_used: Policy,
}

/// Result of a successful completion.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionOutcome {
    pub message: String,
}

/// The scheduling engine. Holds the registry handle and options; all
/// pass state lives on the stack of one `schedule()` call.
#[derive(Clone)]
pub struct Engine {
    state: Registry,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with default options.
    pub fn new(state: Registry) -> Self {
        Self::with_config(state, EngineConfig::default())
    }

    /// Create an engine with explicit options.
    pub fn with_config(state: Registry, config: EngineConfig) -> Self {
        Self { state, config }
    }

    /// Run one scheduling pass over the current registry contents.
    ///
    /// Fails without mutating anything when no VM records or no pending
    /// tasks exist, and with `NothingScheduled` when every placement
    /// attempt misses. Otherwise returns the placements made; tasks that
    /// found no host remain pending.
    pub fn schedule(&self) -> SchedulerResult<ScheduleOutcome> {
        let mut vms = self.state.list_resources()?;
        if vms.is_empty() {
            return Err(SchedulerError::NoResourcesAvailable);
        }
        let mut tasks = self.state.list_pending_tasks()?;
        if tasks.is_empty() {
            return Err(SchedulerError::NoPendingTasks);
        }

        let profile =
            WorkloadProfile::from_tasks(&tasks).ok_or(SchedulerError::NoPendingTasks)?;
        let policy = select_policy(&profile);
        order_tasks(&mut tasks, policy);

        let mut scheduled = Vec::new();
        for task in &tasks {
            let Some(idx) = find_host(task, &vms) else {
                debug!(task = %task.id, "no feasible host, task stays pending");
                continue;
            };

            // Reserve on the local copy first so the rest of the pass
            // sees the new load, then commit record by record.
            apply_assignment(&mut vms[idx], task);
            let vm_id = vms[idx].id.clone();

            self.state
                .update_task_status(&task.id, TaskStatus::Running, Some(&vm_id))?;
            self.state.put_assignment(&AssignmentRecord {
                task_id: task.id.clone(),
                vm_id: vm_id.clone(),
                assigned_at: epoch_secs(),
            })?;
            self.state
                .update_resource_load(&vm_id, vms[idx].current_load, vms[idx].status)?;

            info!(task = %task.id, vm = %vm_id, load = vms[idx].current_load, "task placed");
            scheduled.push(ScheduledTask {
                task_id: task.id.clone(),
                vm_id,
                time_required_sec: task.time_required_sec,
            });
        }

        if scheduled.is_empty() {
            return Err(SchedulerError::NothingScheduled);
        }
        info!(placed = scheduled.len(), total = tasks.len(), ?policy, "pass finished");
        Ok(ScheduleOutcome {
            scheduled,
            algorithm_used: policy,
        })
    }

    /// Mark a running task completed and release its CPU reservation on
    /// the named VM.
    ///
    /// A task that is already completed is an error, so load is never
    /// double-subtracted. The recorded assignment is only cross-checked
    /// against `vm_id` in strict mode.
    pub fn complete_task(
        &self,
        task_id: &str,
        vm_id: &str,
    ) -> SchedulerResult<CompletionOutcome> {
        if task_id.trim().is_empty() || vm_id.trim().is_empty() {
            return Err(SchedulerError::MissingArguments);
        }

        let task = self
            .state
            .get_task(task_id)?
            .ok_or_else(|| SchedulerError::TaskNotFound(task_id.to_string()))?;
        let mut vm = self
            .state
            .get_resource(vm_id)?
            .ok_or_else(|| SchedulerError::ResourceNotFound(vm_id.to_string()))?;

        if task.status == TaskStatus::Completed {
            return Err(SchedulerError::TaskAlreadyCompleted(task_id.to_string()));
        }
        if self.config.strict_completion && task.assigned_vm_id.as_deref() != Some(vm_id) {
            return Err(SchedulerError::AssignmentMismatch {
                task_id: task_id.to_string(),
                supplied: vm_id.to_string(),
            });
        }

        release_assignment(&mut vm, &task);
        self.state
            .update_task_status(task_id, TaskStatus::Completed, None)?;
        self.state
            .update_resource_load(vm_id, vm.current_load, vm.status)?;

        info!(task = %task_id, vm = %vm_id, load = vm.current_load, "task completed");
        Ok(CompletionOutcome {
            message: format!("task {task_id} completed, resource {vm_id} load released"),
        })
    }
}

/// Current Unix epoch in seconds.
fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
