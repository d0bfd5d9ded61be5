//! Two-phase first-fit host search.
//!
//! Phase 1 prefers idle hosts and tests requirements against full
//! capacity. Phase 2 falls back to any host with enough unreserved CPU;
//! RAM and storage are still tested against total capacity there — only
//! CPU tracks existing load. Within each phase the first feasible VM in
//! snapshot order wins; there is no best-fit ranking.

use tracing::trace;

use taskgrid_state::{TaskRecord, VmRecord, VmStatus};

/// Find a host for `task`, returning its index into `vms`.
///
/// Both phases scan in snapshot order. Callers mutate the chosen VM's
/// load before the next search so later tasks in the same pass observe
/// it.
pub fn find_host(task: &TaskRecord, vms: &[VmRecord]) -> Option<usize> {
    // Phase 1: idle hosts only.
    let idle = vms
        .iter()
        .position(|vm| vm.status == VmStatus::Available && fits_idle(task, vm));
    if let Some(idx) = idle {
        trace!(task = %task.id, vm = %vms[idx].id, "idle host matched");
        return Some(idx);
    }

    // Phase 2: any host with enough unreserved CPU.
    let shared = vms.iter().position(|vm| fits_shared(task, vm));
    if let Some(idx) = shared {
        trace!(task = %task.id, vm = %vms[idx].id, "shared host matched");
    }
    shared
}

/// Full-capacity feasibility, used when the host is idle.
fn fits_idle(task: &TaskRecord, vm: &VmRecord) -> bool {
    vm.cpu_cores >= task.cpu_required
        && vm.ram_mb >= task.ram_required_mb
        && vm.storage_gb * 1024 >= task.disk_storage_mb
}

/// Shared-host feasibility: CPU against the unreserved remainder, RAM and
/// storage against total capacity.
fn fits_shared(task: &TaskRecord, vm: &VmRecord) -> bool {
    let remaining_cpu = vm.cpu_cores.saturating_sub(vm.current_load);
    remaining_cpu >= task.cpu_required
        && vm.ram_mb >= task.ram_required_mb
        && vm.storage_gb * 1024 >= task.disk_storage_mb
}
