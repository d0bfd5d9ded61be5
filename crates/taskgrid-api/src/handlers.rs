//! REST API handlers.
//!
//! Each handler reads/writes via the `Registry` or calls the `Engine`,
//! and returns JSON responses in a `{success, data?, error?}` envelope.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use taskgrid_scheduler::SchedulerError;
use taskgrid_state::{StateError, TaskSpec, VmSpec};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// Map registry errors onto status codes: duplicate ids are a caller
/// mistake, missing ids are 404, anything else is a store fault.
fn state_error_status(err: &StateError) -> StatusCode {
    match err {
        StateError::Duplicate(_) => StatusCode::BAD_REQUEST,
        StateError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map engine errors onto status codes. Capacity and validation failures
/// are 400s; unknown records are 404s.
fn scheduler_error_status(err: &SchedulerError) -> StatusCode {
    match err {
        SchedulerError::TaskNotFound(_) | SchedulerError::ResourceNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        SchedulerError::State(e) => state_error_status(e),
        _ => StatusCode::BAD_REQUEST,
    }
}

// ── Resources ──────────────────────────────────────────────────

/// GET /api/v1/resources
pub async fn list_resources(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_resources() {
        Ok(resources) => ApiResponse::ok(resources).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// POST /api/v1/resources
pub async fn create_resource(
    State(state): State<ApiState>,
    Json(spec): Json<VmSpec>,
) -> impl IntoResponse {
    match state.store.create_resource(&spec) {
        Ok(record) => (StatusCode::CREATED, ApiResponse::ok(record)).into_response(),
        Err(e) => error_response(&e.to_string(), state_error_status(&e)).into_response(),
    }
}

/// GET /api/v1/resources/{id}
pub async fn get_resource(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_resource(&id) {
        Ok(Some(record)) => ApiResponse::ok(record).into_response(),
        Ok(None) => error_response("resource not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// DELETE /api/v1/resources/{id}
pub async fn delete_resource(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_resource(&id) {
        Ok(true) => ApiResponse::ok("deleted").into_response(),
        Ok(false) => error_response("resource not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

// ── Tasks ──────────────────────────────────────────────────────

/// GET /api/v1/tasks
pub async fn list_tasks(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_tasks() {
        Ok(tasks) => ApiResponse::ok(tasks).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// POST /api/v1/tasks
pub async fn create_task(
    State(state): State<ApiState>,
    Json(spec): Json<TaskSpec>,
) -> impl IntoResponse {
    match state.store.create_task(&spec) {
        Ok(record) => (StatusCode::CREATED, ApiResponse::ok(record)).into_response(),
        Err(e) => error_response(&e.to_string(), state_error_status(&e)).into_response(),
    }
}

/// GET /api/v1/tasks/{id}
pub async fn get_task(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_task(&id) {
        Ok(Some(record)) => ApiResponse::ok(record).into_response(),
        Ok(None) => error_response("task not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// DELETE /api/v1/tasks/{id}
pub async fn delete_task(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_task(&id) {
        Ok(true) => ApiResponse::ok("deleted").into_response(),
        Ok(false) => error_response("task not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

// ── Scheduling ─────────────────────────────────────────────────

/// POST /api/v1/schedule
pub async fn run_schedule(State(state): State<ApiState>) -> impl IntoResponse {
    match state.engine.schedule() {
        Ok(outcome) => {
            tracing::debug!(placed = outcome.scheduled.len(), "schedule request served");
            ApiResponse::ok(outcome).into_response()
        }
        Err(e) => error_response(&e.to_string(), scheduler_error_status(&e)).into_response(),
    }
}

/// Completion request body.
#[derive(serde::Deserialize)]
pub struct CompleteRequest {
    pub vm_id: String,
}

/// POST /api/v1/tasks/{id}/complete
pub async fn complete_task(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<CompleteRequest>,
) -> impl IntoResponse {
    match state.engine.complete_task(&id, &req.vm_id) {
        Ok(outcome) => ApiResponse::ok(outcome).into_response(),
        Err(e) => error_response(&e.to_string(), scheduler_error_status(&e)).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskgrid_scheduler::Engine;
    use taskgrid_state::{Registry, UserType};

    fn test_state() -> ApiState {
        let store = Registry::open_in_memory().unwrap();
        let engine = Engine::new(store.clone());
        ApiState { store, engine }
    }

    fn test_vm(id: &str) -> VmSpec {
        VmSpec {
            id: id.to_string(),
            cpu_cores: 4,
            ram_mb: 8192,
            storage_gb: 10,
            energy_rate: 0.1,
        }
    }

    fn test_task(id: &str) -> TaskSpec {
        TaskSpec {
            id: id.to_string(),
            cpu_required: 2,
            ram_required_mb: 1024,
            disk_storage_mb: 1024,
            user_type: UserType::Regular,
            time_required_sec: 5,
        }
    }

    #[tokio::test]
    async fn list_resources_empty() {
        let state = test_state();
        let resp = list_resources(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_and_get_resource() {
        let state = test_state();

        let resp = create_resource(State(state.clone()), Json(test_vm("vm-1")))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = get_resource(State(state), Path("vm-1".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_resource_is_bad_request() {
        let state = test_state();
        state.store.create_resource(&test_vm("vm-1")).unwrap();

        let resp = create_resource(State(state), Json(test_vm("vm-1")))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_nonexistent_resource() {
        let state = test_state();
        let resp = get_resource(State(state), Path("nope".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_resource_twice() {
        let state = test_state();
        state.store.create_resource(&test_vm("vm-1")).unwrap();

        let resp = delete_resource(State(state.clone()), Path("vm-1".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = delete_resource(State(state), Path("vm-1".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_task_is_bad_request() {
        let state = test_state();
        state.store.create_task(&test_task("t-1")).unwrap();

        let resp = create_task(State(state), Json(test_task("t-1")))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn schedule_with_empty_registry_is_bad_request() {
        let state = test_state();
        let resp = run_schedule(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn schedule_then_complete_round_trip() {
        let state = test_state();
        state.store.create_resource(&test_vm("vm-1")).unwrap();
        state.store.create_task(&test_task("t-1")).unwrap();

        let resp = run_schedule(State(state.clone())).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = complete_task(
            State(state.clone()),
            Path("t-1".to_string()),
            Json(CompleteRequest {
                vm_id: "vm-1".to_string(),
            }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        // A second completion of the same task is rejected.
        let resp = complete_task(
            State(state),
            Path("t-1".to_string()),
            Json(CompleteRequest {
                vm_id: "vm-1".to_string(),
            }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn complete_unknown_task_is_not_found() {
        let state = test_state();
        state.store.create_resource(&test_vm("vm-1")).unwrap();

        let resp = complete_task(
            State(state),
            Path("ghost".to_string()),
            Json(CompleteRequest {
                vm_id: "vm-1".to_string(),
            }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
