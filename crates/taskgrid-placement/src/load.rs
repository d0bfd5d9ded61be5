//! Load accounting — the single source of truth for capacity consumption.
//!
//! Both the assignment and completion transitions derive the VM's status
//! through [`status_for`]; nothing else in the workspace sets a status.

use taskgrid_state::{TaskRecord, VmRecord, VmStatus};

/// Derive a VM's status from its load and CPU capacity.
///
/// `available` iff the load is zero; `full` iff the load has reached
/// capacity; `busy` in between.
pub fn status_for(current_load: u32, cpu_cores: u32) -> VmStatus {
    if current_load == 0 {
        VmStatus::Available
    } else if current_load < cpu_cores {
        VmStatus::Busy
    } else {
        VmStatus::Full
    }
}

/// Reserve a task's CPU requirement on a VM.
pub fn apply_assignment(vm: &mut VmRecord, task: &TaskRecord) {
    vm.current_load += task.cpu_required;
    vm.status = status_for(vm.current_load, vm.cpu_cores);
}

/// Release a completed task's CPU reservation. The load floors at zero.
pub fn release_assignment(vm: &mut VmRecord, task: &TaskRecord) {
    vm.current_load = vm.current_load.saturating_sub(task.cpu_required);
    vm.status = status_for(vm.current_load, vm.cpu_cores);
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskgrid_state::{TaskSpec, UserType, VmSpec};

    fn vm(cpu: u32) -> VmRecord {
        VmRecord::new(&VmSpec {
            id: "vm-1".to_string(),
            cpu_cores: cpu,
            ram_mb: 8192,
            storage_gb: 100,
            energy_rate: 0.0,
        })
    }

    fn task(cpu: u32) -> TaskRecord {
        TaskRecord::new(&TaskSpec {
            id: "t-1".to_string(),
            cpu_required: cpu,
            ram_required_mb: 256,
            disk_storage_mb: 128,
            user_type: UserType::Regular,
            time_required_sec: 10,
        })
    }

    #[test]
    fn status_derivation_covers_all_bands() {
        assert_eq!(status_for(0, 4), VmStatus::Available);
        assert_eq!(status_for(1, 4), VmStatus::Busy);
        assert_eq!(status_for(3, 4), VmStatus::Busy);
        assert_eq!(status_for(4, 4), VmStatus::Full);
        assert_eq!(status_for(9, 4), VmStatus::Full);
    }

    #[test]
    fn zero_load_is_available_even_with_zero_capacity() {
        assert_eq!(status_for(0, 0), VmStatus::Available);
    }

    #[test]
    fn assignment_accumulates_load() {
        let mut host = vm(4);

        apply_assignment(&mut host, &task(2));
        assert_eq!(host.current_load, 2);
        assert_eq!(host.status, VmStatus::Busy);

        apply_assignment(&mut host, &task(2));
        assert_eq!(host.current_load, 4);
        assert_eq!(host.status, VmStatus::Full);
    }

    #[test]
    fn release_is_the_inverse_of_assignment() {
        let mut host = vm(4);
        let t = task(3);

        apply_assignment(&mut host, &t);
        release_assignment(&mut host, &t);

        assert_eq!(host.current_load, 0);
        assert_eq!(host.status, VmStatus::Available);
    }

    #[test]
    fn release_floors_at_zero() {
        let mut host = vm(4);
        host.current_load = 1;
        host.status = status_for(1, 4);

        release_assignment(&mut host, &task(3));

        assert_eq!(host.current_load, 0);
        assert_eq!(host.status, VmStatus::Available);
    }

    #[test]
    fn partial_release_leaves_busy() {
        let mut host = vm(4);
        apply_assignment(&mut host, &task(2));
        apply_assignment(&mut host, &task(2));

        release_assignment(&mut host, &task(2));

        assert_eq!(host.current_load, 2);
        assert_eq!(host.status, VmStatus::Busy);
    }

    #[test]
    fn zero_cpu_task_leaves_idle_host_available() {
        let mut host = vm(4);

        apply_assignment(&mut host, &task(0));

        assert_eq!(host.current_load, 0);
        assert_eq!(host.status, VmStatus::Available);
    }
}
