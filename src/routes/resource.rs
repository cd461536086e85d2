//! Resource CRUD routes built from the resolved model.
//! Route paths may contain `/` (e.g. `table/butter-tank`), so each resource
//! gets its own router nested at `/api/<path>` with the resource in its state.

use crate::handlers::resource::{create, delete, list, read, update, update_by_id};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn resource_routes(state: AppState) -> Router {
    state.model.resources.iter().fold(Router::new(), |router, resource| {
        let routes = Router::new()
            .route("/", get(list).post(create).put(update).delete(delete))
            .route("/:id", get(read).put(update_by_id))
            .with_state(state.for_resource(resource));
        router.nest(&format!("/api/{}", resource.path), routes)
    })
}
