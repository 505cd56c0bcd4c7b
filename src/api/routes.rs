use crate::api::{handlers, AppState};
use crate::namespace::namespace_middleware;
use axum::{
    middleware,
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    let resolver = state.resolver.clone();

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::health_check))
        .route("/health/ready", get(handlers::health_check))
        // Search
        .route("/v1beta1/search", get(handlers::search_assets))
        .route("/v1beta1/search/suggest", get(handlers::suggest_assets))
        // Asset documents
        .route(
            "/v1beta1/assets",
            put(handlers::upsert_asset).delete(handlers::delete_asset_by_urn),
        )
        .route("/v1beta1/assets/types", get(handlers::asset_type_counts))
        .route("/v1beta1/assets/:id", delete(handlers::delete_asset))
        // Namespaces
        .route(
            "/v1beta1/namespaces",
            get(handlers::list_namespaces).post(handlers::create_namespace),
        )
        .route(
            "/v1beta1/namespaces/:urn",
            get(handlers::get_namespace).put(handlers::update_namespace),
        )
        // Tenant resolution for everything but health
        .layer(middleware::from_fn_with_state(resolver, namespace_middleware))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
