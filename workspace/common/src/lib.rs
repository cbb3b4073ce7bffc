//! Transport-layer types shared by the API handlers and their clients.
//! Request bodies carry `validator` rules for what can be checked without the
//! database; everything else is validated by the service layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Generic API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ===================== Users =====================

/// Request body for provisioning an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct CreateUserRequest {
    /// 64-bit Steam account id (must be unique)
    pub steam_id: i64,
    pub user_name: String,
    /// Player, Moderator or Admin. Defaults to Player.
    pub role: Option<String>,
    /// 32x32 avatar URL
    #[validate(url)]
    pub avatar_small: Option<String>,
    /// 64x64 avatar URL
    #[validate(url)]
    pub avatar_medium: Option<String>,
    /// 184x184 avatar URL
    #[validate(url)]
    pub avatar_full: Option<String>,
}

/// Request body for a platform login. Provisions the account on first login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct SteamLoginRequest {
    pub steam_id: i64,
    pub user_name: String,
    #[validate(url)]
    pub avatar_small: Option<String>,
    #[validate(url)]
    pub avatar_medium: Option<String>,
    #[validate(url)]
    pub avatar_full: Option<String>,
}

/// Request body for updating a profile.
///
/// Omitted fields stay as they are; an explicit `null` avatar removes the link.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq, Default)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1))]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub avatar_small: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub avatar_medium: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub avatar_full: Option<Option<String>>,
}

/// Request body for changing a balance by a signed amount.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AdjustMoneyRequest {
    /// Positive to credit, negative to debit
    pub delta: i32,
}

/// Request body for changing a user's role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ChangeRoleRequest {
    /// Player, Moderator or Admin
    pub role: String,
}

/// User response model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UserDto {
    pub id: i32,
    pub steam_id: i64,
    pub user_name: String,
    pub money: i32,
    pub role: String,
    pub avatar_small: Option<String>,
    pub avatar_medium: Option<String>,
    pub avatar_full: Option<String>,
    pub user_equipment_ids: Vec<i32>,
    pub character_ids: Vec<i32>,
    /// Row version; changes on every write
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub last_modified_at: Option<DateTime<Utc>>,
    pub last_modified_by: Option<String>,
}

// ===================== Owned instances =====================

/// Request body for creating a character.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct CreateCharacterRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

/// Request body for granting an equipment instance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq)]
pub struct GrantEquipmentRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

/// Request body for moving an owned instance between users.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TransferRequest {
    /// The user that currently owns the instance
    pub from_user_id: i32,
    pub to_user_id: i32,
}

/// Character response model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CharacterDto {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub last_modified_at: Option<DateTime<Utc>>,
    pub last_modified_by: Option<String>,
}

/// Equipment instance response model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UserEquipmentDto {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub last_modified_at: Option<DateTime<Utc>>,
    pub last_modified_by: Option<String>,
}
