use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use posterflow_core::config::PosterflowConfig;
use posterflow_scheduler::TickWindow;
use posterflow_store::{CustomerStore, PosterStore, ScheduleStore};

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
///
/// The stores here share one gateway-side connection; the dispatch engine
/// runs on its own connections so a slow send never blocks a request.
pub struct AppState {
    pub config: PosterflowConfig,
    pub schedules: ScheduleStore,
    pub customers: CustomerStore,
    pub posters: PosterStore,
    pub window: TickWindow,
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(
            "/schedules/create",
            post(crate::http::schedules::create_schedules),
        )
        .route("/schedules/", get(crate::http::schedules::list_schedules))
        .route(
            "/schedules/{id}",
            delete(crate::http::schedules::delete_schedule),
        )
        .route(
            "/customers",
            post(crate::http::customers::create_customer).get(crate::http::customers::list_customers),
        )
        .route(
            "/posters",
            post(crate::http::posters::create_poster).get(crate::http::posters::list_posters),
        )
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
