use crate::handlers::{
    characters::{create_character, delete_character, get_user_characters, transfer_character},
    health::health_check,
    user_equipments::{get_user_equipments, grant_equipment, remove_equipment, transfer_equipment},
    users::{
        adjust_user_money, change_user_role, create_user, delete_user, get_user,
        get_user_by_steam_id, get_users, login_user, update_user,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // User routes
        .route("/api/v1/users", post(create_user).get(get_users))
        .route("/api/v1/users/login", post(login_user))
        .route("/api/v1/users/steam/:steam_id", get(get_user_by_steam_id))
        .route(
            "/api/v1/users/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/v1/users/:user_id/money", post(adjust_user_money))
        .route("/api/v1/users/:user_id/role", put(change_user_role))
        // Characters
        .route(
            "/api/v1/users/:user_id/characters",
            get(get_user_characters).post(create_character),
        )
        .route(
            "/api/v1/users/:user_id/characters/:character_id",
            delete(delete_character),
        )
        .route("/api/v1/characters/:character_id/transfer", post(transfer_character))
        // Equipment instances
        .route(
            "/api/v1/users/:user_id/equipment",
            get(get_user_equipments).post(grant_equipment),
        )
        .route(
            "/api/v1/users/:user_id/equipment/:equipment_id",
            delete(remove_equipment),
        )
        .route("/api/v1/equipment/:equipment_id/transfer", post(transfer_equipment))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
