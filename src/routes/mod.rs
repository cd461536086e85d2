//! Router assembly.

mod common;
mod resource;

pub use common::common_routes;
pub use resource::resource_routes;

use crate::error::AppError;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

async fn fallback() -> impl IntoResponse {
    AppError::Rejected {
        status: StatusCode::NOT_FOUND,
        message: "Endpoint tidak ditemukan".into(),
        cause: "Not found".into(),
    }
}

/// The full application: common routes, every resource, CORS, tracing and a body limit.
pub fn app(state: AppState, body_limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    common_routes(state.clone())
        .merge(resource_routes(state))
        .fallback(fallback)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
