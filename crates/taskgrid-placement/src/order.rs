//! Per-policy reordering of the pending-task snapshot.
//!
//! Exactly one rule per policy. Sorts are stable: ties keep the order the
//! registry returned, which is the arrival (key) order.

use taskgrid_state::TaskRecord;

use crate::policy::Policy;

/// Reorder the pass snapshot in place according to the selected policy.
///
/// Arrival-order policies leave the snapshot untouched.
pub fn order_tasks(tasks: &mut [TaskRecord], policy: Policy) {
    match policy {
        Policy::ShortestJobFirst => {
            tasks.sort_by_key(|t| t.time_required_sec);
        }
        Policy::Priority => {
            tasks.sort_by(|a, b| {
                b.user_type
                    .priority_rank()
                    .cmp(&a.user_type.priority_rank())
            });
        }
        Policy::HighVarianceArrival | Policy::FirstComeFirstServed => {}
    }
}
