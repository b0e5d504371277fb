use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod auth;
mod consultations;
mod health;
mod results;

pub fn create_router(state: AppState) -> Router {
    // Any origin, with credentials: mirror the request instead of `*`
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth routes
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/profile", get(auth::profile))
        .route("/auth/me", get(auth::me))
        // Consultation routes
        .route(
            "/consultations",
            post(consultations::create).get(consultations::list),
        )
        .route("/consultations/doctors", get(consultations::doctors))
        .route("/consultations/:id", get(consultations::get_one))
        .route("/consultations/:id/messages", post(consultations::add_message))
        .route("/consultations/:id/status", patch(consultations::update_status))
        // Result routes
        .route("/results", post(results::create))
        .route("/results/public", get(results::public))
        .route("/results/procedure/:procedure", get(results::by_procedure))
        .route("/results/my", get(results::mine))
        .route("/results/all", get(results::all))
        .route(
            "/results/:id",
            get(results::get_one).put(results::update).delete(results::remove),
        );

    let prefix = state.config.route_prefix();
    let router = if prefix == "/" {
        Router::new().merge(api)
    } else {
        Router::new().nest(&prefix, api)
    };

    router
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
