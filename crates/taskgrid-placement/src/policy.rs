//! Ordering-policy selection from the pending-task population.
//!
//! A cheap, stateless heuristic: profile the pending snapshot (timing
//! statistics plus the presence of non-regular users) and walk a fixed
//! priority chain of conditions. Recomputed fresh on every pass; no memory
//! of past decisions.

use serde::{Deserialize, Serialize};
use tracing::debug;

use taskgrid_state::{TaskRecord, UserType};

/// Mean `time_required_sec` at or above which short-job ordering stops
/// paying off.
const SJF_AVG_TIME_CEILING: f64 = 15.0;

/// Largest min-to-max spread of `time_required_sec` still considered
/// uniform.
const TIME_SPREAD_CEILING: u32 = 10;

/// Ordering policy applied to one scheduling pass.
///
/// Variant names say what each policy does; the serialized forms are the
/// external contract. `rr` is a historical wire label — it selects
/// arrival-order processing and does not cycle hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Policy {
    /// Descending user-tier order: vip, premium, regular.
    #[serde(rename = "priority")]
    Priority,
    /// Ascending `time_required_sec` order.
    #[serde(rename = "sjf")]
    ShortestJobFirst,
    /// Arrival order, chosen for high-variance timing workloads.
    #[serde(rename = "rr")]
    HighVarianceArrival,
    /// Arrival order, the default.
    #[serde(rename = "fcfs")]
    FirstComeFirstServed,
}

/// Aggregate statistics over the pending-task snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadProfile {
    /// Mean of `time_required_sec`.
    pub avg_time: f64,
    pub min_time: u32,
    pub max_time: u32,
    /// True if any task's user tier is above regular.
    pub has_priority: bool,
}

impl WorkloadProfile {
    /// Profile a pending snapshot. Returns `None` on an empty snapshot;
    /// the engine rejects empty passes before selection runs.
    pub fn from_tasks(tasks: &[TaskRecord]) -> Option<Self> {
        if tasks.is_empty() {
            return None;
        }
        let total: u64 = tasks.iter().map(|t| u64::from(t.time_required_sec)).sum();
        let min_time = tasks.iter().map(|t| t.time_required_sec).min().unwrap_or(0);
        let max_time = tasks.iter().map(|t| t.time_required_sec).max().unwrap_or(0);
        let has_priority = tasks.iter().any(|t| t.user_type != UserType::Regular);
        Some(Self {
            avg_time: total as f64 / tasks.len() as f64,
            min_time,
            max_time,
            has_priority,
        })
    }

    /// Min-to-max spread of `time_required_sec`.
    pub fn time_spread(&self) -> u32 {
        self.max_time - self.min_time
    }
}

/// Pick the ordering policy for a pass.
///
/// The conditions form a priority chain, evaluated in order with first
/// match winning — the presence of non-regular users short-circuits every
/// timing-based rule.
pub fn select_policy(profile: &WorkloadProfile) -> Policy {
    let policy = if profile.has_priority {
        Policy::Priority
    } else if profile.avg_time < SJF_AVG_TIME_CEILING
        && profile.time_spread() <= TIME_SPREAD_CEILING
    {
        Policy::ShortestJobFirst
    } else if profile.time_spread() > TIME_SPREAD_CEILING {
        Policy::HighVarianceArrival
    } else {
        Policy::FirstComeFirstServed
    };
    debug!(
        avg_time = profile.avg_time,
        spread = profile.time_spread(),
        has_priority = profile.has_priority,
        ?policy,
        "policy selected"
    );
    policy
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskgrid_state::TaskSpec;

    fn task_with_time(id: &str, time: u32) -> TaskRecord {
        TaskRecord::new(&TaskSpec {
            id: id.to_string(),
            cpu_required: 1,
            ram_required_mb: 256,
            disk_storage_mb: 128,
            user_type: UserType::Regular,
            time_required_sec: time,
        })
    }

    fn task_with_user(id: &str, user_type: UserType, time: u32) -> TaskRecord {
        let mut task = task_with_time(id, time);
        task.user_type = user_type;
        task
    }

    #[test]
    fn empty_snapshot_has_no_profile() {
        assert!(WorkloadProfile::from_tasks(&[]).is_none());
    }

    #[test]
    fn profile_aggregates_timing() {
        let tasks = vec![
            task_with_time("a", 5),
            task_with_time("b", 10),
            task_with_time("c", 30),
        ];
        let profile = WorkloadProfile::from_tasks(&tasks).unwrap();

        assert_eq!(profile.avg_time, 15.0);
        assert_eq!(profile.min_time, 5);
        assert_eq!(profile.max_time, 30);
        assert_eq!(profile.time_spread(), 25);
        assert!(!profile.has_priority);
    }

    #[test]
    fn short_uniform_workload_selects_sjf() {
        let tasks = vec![task_with_time("a", 5), task_with_time("b", 8)];
        let profile = WorkloadProfile::from_tasks(&tasks).unwrap();

        assert_eq!(select_policy(&profile), Policy::ShortestJobFirst);
    }

    #[test]
    fn high_variance_selects_arrival_order_label() {
        // avg 20 (not short), spread 30 (not uniform).
        let tasks = vec![task_with_time("a", 5), task_with_time("b", 35)];
        let profile = WorkloadProfile::from_tasks(&tasks).unwrap();

        assert_eq!(select_policy(&profile), Policy::HighVarianceArrival);
    }

    #[test]
    fn long_uniform_workload_falls_through_to_fcfs() {
        // avg 20, spread 4: neither short nor high-variance.
        let tasks = vec![task_with_time("a", 18), task_with_time("b", 22)];
        let profile = WorkloadProfile::from_tasks(&tasks).unwrap();

        assert_eq!(select_policy(&profile), Policy::FirstComeFirstServed);
    }

    #[test]
    fn priority_short_circuits_timing_rules() {
        // Timing alone would pick sjf, but one vip user wins first.
        let tasks = vec![
            task_with_user("a", UserType::Vip, 5),
            task_with_user("b", UserType::Regular, 5),
        ];
        let profile = WorkloadProfile::from_tasks(&tasks).unwrap();

        assert_eq!(select_policy(&profile), Policy::Priority);
    }

    #[test]
    fn premium_alone_also_triggers_priority() {
        let tasks = vec![task_with_user("a", UserType::Premium, 50)];
        let profile = WorkloadProfile::from_tasks(&tasks).unwrap();

        assert_eq!(select_policy(&profile), Policy::Priority);
    }

    #[test]
    fn short_workload_with_wide_spread_is_high_variance() {
        // avg 8.5 < 15 but spread 15 > 10: the uniformity clause fails,
        // the variance clause fires.
        let tasks = vec![task_with_time("a", 1), task_with_time("b", 16)];
        let profile = WorkloadProfile::from_tasks(&tasks).unwrap();

        assert_eq!(select_policy(&profile), Policy::HighVarianceArrival);
    }

    #[test]
    fn spread_boundary_stays_sjf() {
        // Spread of exactly 10 still counts as uniform.
        let tasks = vec![task_with_time("a", 2), task_with_time("b", 12)];
        let profile = WorkloadProfile::from_tasks(&tasks).unwrap();

        assert_eq!(select_policy(&profile), Policy::ShortestJobFirst);
    }

    #[test]
    fn wire_labels_are_contract_spellings() {
        assert_eq!(serde_json::to_string(&Policy::Priority).unwrap(), "\"priority\"");
        assert_eq!(serde_json::to_string(&Policy::ShortestJobFirst).unwrap(), "\"sjf\"");
        assert_eq!(serde_json::to_string(&Policy::HighVarianceArrival).unwrap(), "\"rr\"");
        assert_eq!(serde_json::to_string(&Policy::FirstComeFirstServed).unwrap(), "\"fcfs\"");
    }
}
