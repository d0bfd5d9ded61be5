//! Engine error types.

use thiserror::Error;

/// Errors that can occur during scheduling and completion.
///
/// All are terminal: the engine never retries a failed placement or
/// completion, and an unplaced task simply waits for the next pass.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("no VM resources exist in the registry")]
    NoResourcesAvailable,

    #[error("no pending tasks to schedule")]
    NoPendingTasks,

    #[error("no tasks could be placed: every VM lacks capacity")]
    NothingScheduled,

    #[error("task_id and vm_id are required")]
    MissingArguments,

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("task already completed: {0}")]
    TaskAlreadyCompleted(String),

    #[error("task {task_id} is not assigned to {supplied}")]
    AssignmentMismatch { task_id: String, supplied: String },

    #[error("registry error: {0}")]
    State(#[from] taskgrid_state::StateError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
