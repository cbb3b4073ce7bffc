use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::{self, AuditInfo, Auditable};

/// Authorization level of an account.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Role {
    #[default]
    #[sea_orm(string_value = "Player")]
    Player,
    #[sea_orm(string_value = "Moderator")]
    Moderator,
    #[sea_orm(string_value = "Admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Player => "Player",
            Role::Moderator => "Moderator",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known role.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Accepts the stored spelling as well as lower-case input from API clients.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "player" => Ok(Role::Player),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// A player account, keyed by its Steam identity.
/// Owns the player's characters and equipment instances.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 64-bit Steam account id.
    #[sea_orm(unique)]
    pub steam_id: i64,
    pub user_name: String,
    /// In-game currency balance.
    #[sea_orm(default_value = 0)]
    pub money: i32,
    pub role: Role,
    /// 32x32
    pub avatar_small: Option<String>,
    /// 64x64
    pub avatar_medium: Option<String>,
    /// 184x184
    pub avatar_full: Option<String>,
    /// Bumped on every persisted write; used for optimistic concurrency.
    #[sea_orm(default_value = 1)]
    pub version: i32,
    pub created_at: DateTimeUtc,
    pub created_by: Option<String>,
    pub last_modified_at: Option<DateTimeUtc>,
    pub last_modified_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A user owns any number of characters.
    #[sea_orm(has_many = "super::character::Entity")]
    Character,
    /// A user owns any number of equipment instances.
    #[sea_orm(has_many = "super::user_equipment::Entity")]
    UserEquipment,
}

impl Related<super::character::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Character.def()
    }
}

impl Related<super::user_equipment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserEquipment.def()
    }
}

impl Auditable for Model {
    fn audit_info(&self) -> AuditInfo {
        AuditInfo {
            created_at: self.created_at,
            created_by: self.created_by.clone(),
            last_modified_at: self.last_modified_at,
            last_modified_by: self.last_modified_by.clone(),
        }
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            if self.version.is_not_set() {
                self.version = Set(1);
            }
            if self.role.is_not_set() {
                self.role = Set(Role::default());
            }
            if self.money.is_not_set() {
                self.money = Set(0);
            }
        }
        audit::stamp(
            &mut self.created_at,
            &mut self.created_by,
            &mut self.last_modified_at,
            &mut self.last_modified_by,
            insert,
        );
        Ok(self)
    }
}
