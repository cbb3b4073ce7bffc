pub mod characters;
pub mod health;
pub mod user_equipments;
pub mod users;

use axum::{
    http::{HeaderMap, StatusCode},
    response::Json,
};
use model::entities::{character, user_equipment};
use model::User;
use service::ServiceError;
use tracing::{error, warn};

use crate::schemas::{CharacterDto, ErrorResponse, UserDto, UserEquipmentDto};

/// Header naming who performs a write. Recorded in the audit columns.
pub const ACTOR_HEADER: &str = "x-actor";
const DEFAULT_ACTOR: &str = "api";

pub type HandlerError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn actor(headers: &HeaderMap) -> String {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_ACTOR)
        .to_string()
}

pub(crate) fn error_response(status: StatusCode, code: &str, error: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Maps a service failure onto the HTTP status and error payload.
pub(crate) fn service_error(err: ServiceError) -> HandlerError {
    let status = match &err {
        ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::Conflict(_) | ServiceError::Ownership(_) => StatusCode::CONFLICT,
        ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    // Database details stay in the logs.
    let message = match &err {
        ServiceError::Database(db_err) => {
            error!("Database failure: {}", db_err);
            "Internal server error".to_string()
        }
        other => {
            warn!("Request rejected: {}", other);
            other.to_string()
        }
    };

    error_response(status, err.code(), message)
}

pub(crate) fn user_dto(user: &User) -> UserDto {
    UserDto {
        id: user.id().0,
        steam_id: user.steam_id,
        user_name: user.user_name.clone(),
        money: user.money,
        role: user.role.to_string(),
        avatar_small: user.avatar_small.as_ref().map(|url| url.to_string()),
        avatar_medium: user.avatar_medium.as_ref().map(|url| url.to_string()),
        avatar_full: user.avatar_full.as_ref().map(|url| url.to_string()),
        user_equipment_ids: user.user_equipments.iter().map(|id| id.0).collect(),
        character_ids: user.characters.iter().map(|id| id.0).collect(),
        version: user.version(),
        created_at: user.audit.created_at,
        created_by: user.audit.created_by.clone(),
        last_modified_at: user.audit.last_modified_at,
        last_modified_by: user.audit.last_modified_by.clone(),
    }
}

pub(crate) fn character_dto(model: character::Model) -> CharacterDto {
    CharacterDto {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        created_at: model.created_at,
        created_by: model.created_by,
        last_modified_at: model.last_modified_at,
        last_modified_by: model.last_modified_by,
    }
}

pub(crate) fn equipment_dto(model: user_equipment::Model) -> UserEquipmentDto {
    UserEquipmentDto {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        created_at: model.created_at,
        created_by: model.created_by,
        last_modified_at: model.last_modified_at,
        last_modified_by: model.last_modified_by,
    }
}
