use crate::handlers::{
    auth::{login, refresh_token, register},
    card_owners::{
        delete_card_owner, get_all_card_owners, get_my_card_owners, register_card_owner,
        register_multiple_cards, search_by_card, search_by_owner, update_card_owner,
        validate_card_registration,
    },
    cards::{create_card, delete_card, get_card, get_card_by_name, get_cards, update_card},
    health::health_check,
    users::{change_password, get_profile, update_profile},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let request_timeout = state.request_timeout;

    let router = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication routes
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/refresh", post(refresh_token))
        // Profile routes
        .route("/api/v1/users/profile", get(get_profile).put(update_profile))
        .route("/api/v1/users/change-password", post(change_password))
        // Card catalog routes
        .route("/api/v1/cards", get(get_cards).post(create_card))
        .route("/api/v1/cards/by-name/:card_name", get(get_card_by_name))
        .route(
            "/api/v1/cards/:card_id",
            get(get_card).put(update_card).delete(delete_card),
        )
        // Card owner routes
        .route(
            "/api/v1/card-owners",
            get(get_my_card_owners).post(register_card_owner),
        )
        .route("/api/v1/card-owners/batch", post(register_multiple_cards))
        .route("/api/v1/card-owners/all", get(get_all_card_owners))
        .route("/api/v1/card-owners/validate", post(validate_card_registration))
        .route("/api/v1/card-owners/search/card", get(search_by_card))
        .route("/api/v1/card-owners/search/owner", get(search_by_owner))
        .route(
            "/api/v1/card-owners/:owner_id",
            put(update_card_owner).delete(delete_card_owner),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Metrics are process-global, so the exporter is left out of test builds.
    #[cfg(not(test))]
    let router = {
        let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();
        router
            .route(
                "/metrics",
                get(move || std::future::ready(metric_handle.render())),
            )
            .layer(prometheus_layer)
    };

    router
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
