use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
///
/// `enable_test_routes` mounts the database reset used by end-to-end suites.
pub fn create_router(state: AppState, enable_test_routes: bool) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/recommendations",
            get(handlers::list_recommendations).post(handlers::create_recommendation),
        )
        .route("/recommendations/random", get(handlers::random_recommendation))
        .route("/recommendations/top/:amount", get(handlers::top_recommendations))
        .route("/recommendations/:id", get(handlers::get_recommendation))
        .route("/recommendations/:id/upvote", post(handlers::upvote))
        .route("/recommendations/:id/downvote", post(handlers::downvote));

    if enable_test_routes {
        router = router.route("/e2e/cleardatabase", post(handlers::clear_database));
    }

    // Request id first, so the trace span can read it
    router
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
