use crate::{auth::require_bearer, rest, AppState};
use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/contact/list", get(rest::handlers::list_services))
        .route("/api/contact/add", post(rest::handlers::add_service))
        .route(
            "/api/contact/{id}",
            get(rest::handlers::get_service).put(rest::handlers::replace_service_payload),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    let cors = cors_layer(&state.settings.security.allowed_origins);

    Router::new()
        // Health check
        .route("/healthz", get(rest::handlers::health))

        // Detail page data with previous/next links
        .route("/contact/{id}", get(rest::handlers::service_detail))

        // OpenAPI document
        .route("/api-docs/openapi.json", get(rest::openapi_json))

        .merge(api)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}
