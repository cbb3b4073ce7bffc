use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

pub use common::{
    AdjustMoneyRequest, ApiResponse, ChangeRoleRequest, CharacterDto, CreateCharacterRequest,
    CreateUserRequest, ErrorResponse, GrantEquipmentRequest, SteamLoginRequest, TransferRequest,
    UpdateUserRequest, UserDto, UserEquipmentDto,
};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache of assembled user payloads, keyed by [`user_cache_key`]
    pub cache: Cache<String, CachedData>,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    User(UserDto),
}

pub fn user_cache_key(user_id: i32) -> String {
    format!("user:{}", user_id)
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::create_user,
        crate::handlers::users::login_user,
        crate::handlers::users::get_users,
        crate::handlers::users::get_user,
        crate::handlers::users::get_user_by_steam_id,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::users::adjust_user_money,
        crate::handlers::users::change_user_role,
        crate::handlers::characters::get_user_characters,
        crate::handlers::characters::create_character,
        crate::handlers::characters::delete_character,
        crate::handlers::characters::transfer_character,
        crate::handlers::user_equipments::get_user_equipments,
        crate::handlers::user_equipments::grant_equipment,
        crate::handlers::user_equipments::remove_equipment,
        crate::handlers::user_equipments::transfer_equipment,
    ),
    components(
        schemas(
            ApiResponse<UserDto>,
            ApiResponse<Vec<UserDto>>,
            ApiResponse<CharacterDto>,
            ApiResponse<Vec<CharacterDto>>,
            ApiResponse<UserEquipmentDto>,
            ApiResponse<Vec<UserEquipmentDto>>,
            ApiResponse<String>,
            ErrorResponse,
            HealthResponse,
            CreateUserRequest,
            SteamLoginRequest,
            UpdateUserRequest,
            AdjustMoneyRequest,
            ChangeRoleRequest,
            CreateCharacterRequest,
            GrantEquipmentRequest,
            TransferRequest,
            UserDto,
            CharacterDto,
            UserEquipmentDto,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Player accounts, balances and roles"),
        (name = "characters", description = "Characters owned by users"),
        (name = "equipment", description = "Equipment instances owned by users"),
    ),
    info(
        title = "TRPG API",
        description = "Player accounts for a tabletop RPG platform: Steam identities, balances, roles and owned characters and equipment",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
