use std::sync::atomic::{AtomicI64, Ordering};

use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

use model::entities::{character, user, user_equipment};

pub type Result<T> = std::result::Result<T, DbErr>;

pub const ACTOR: &str = "test";

/// A Steam id no other helper call has handed out.
pub fn next_steam_id() -> i64 {
    static STEAM_ID: AtomicI64 = AtomicI64::new(76561198100000000);
    STEAM_ID.fetch_add(1, Ordering::SeqCst)
}

pub async fn new_user(db: &DatabaseConnection, name: &str) -> Result<user::Model> {
    user::ActiveModel {
        steam_id: Set(next_steam_id()),
        user_name: Set(name.to_string()),
        created_by: Set(Some(ACTOR.to_string())),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_character(db: &DatabaseConnection, owner: &user::Model, name: &str) -> Result<character::Model> {
    character::ActiveModel {
        user_id: Set(owner.id),
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_equipment(
    db: &DatabaseConnection,
    owner: &user::Model,
    name: &str,
) -> Result<user_equipment::Model> {
    user_equipment::ActiveModel {
        user_id: Set(owner.id),
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
}
