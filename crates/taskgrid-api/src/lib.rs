//! taskgrid-api — REST API for TaskGrid.
//!
//! Provides axum route handlers over the registry and the scheduling
//! engine. The handlers add no decision logic; they parse requests, call
//! through, and map errors onto status codes.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/resources` | List all VM resources |
//! | POST | `/api/v1/resources` | Create a VM resource |
//! | GET | `/api/v1/resources/{id}` | Get one VM resource |
//! | DELETE | `/api/v1/resources/{id}` | Delete a VM resource (cascades assignments) |
//! | GET | `/api/v1/tasks` | List all tasks |
//! | POST | `/api/v1/tasks` | Create a task |
//! | GET | `/api/v1/tasks/{id}` | Get one task |
//! | DELETE | `/api/v1/tasks/{id}` | Delete a task (cascades assignments) |
//! | POST | `/api/v1/tasks/{id}/complete` | Complete a running task |
//! | POST | `/api/v1/schedule` | Run one scheduling pass |

pub mod handlers;

use axum::Router;
use axum::routing::{get, post};
use taskgrid_scheduler::Engine;
use taskgrid_state::Registry;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: Registry,
    pub engine: Engine,
}

/// Build the complete API router.
pub fn build_router(store: Registry, engine: Engine) -> Router {
    let api_state = ApiState { store, engine };

    let api_routes = Router::new()
        .route(
            "/resources",
            get(handlers::list_resources).post(handlers::create_resource),
        )
        .route(
            "/resources/{id}",
            get(handlers::get_resource).delete(handlers::delete_resource),
        )
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route(
            "/tasks/{id}",
            get(handlers::get_task).delete(handlers::delete_task),
        )
        .route("/tasks/{id}/complete", post(handlers::complete_task))
        .route("/schedule", post(handlers::run_schedule))
        .with_state(api_state);

    Router::new().nest("/api/v1", api_routes)
}
