//! Account lifecycle: provisioning, lookup, versioned mutation and deletion.
//!
//! Every write to a user row goes through [`versioned_update`], which only
//! touches the row if its version still matches what the caller read. A zero
//! row count means somebody else wrote first and the caller gets a conflict.

use std::collections::HashMap;

use chrono::Utc;
use model::entities::{character, user, user_equipment};
use model::{CharacterId, Role, User, UserEquipmentId, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{Result, ServiceError};
use crate::validation::{apply_money_delta, check_balance, parse_optional_avatar};

/// Data needed to provision an account, usually taken from the platform profile
/// on first login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub steam_id: i64,
    pub user_name: String,
    /// Defaults to [`Role::Player`].
    pub role: Option<Role>,
    pub avatar_small: Option<String>,
    pub avatar_medium: Option<String>,
    pub avatar_full: Option<String>,
}

/// Partial profile change. For avatars, `Some(None)` clears the link and
/// `None` leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub user_name: Option<String>,
    pub avatar_small: Option<Option<String>>,
    pub avatar_medium: Option<Option<String>>,
    pub avatar_full: Option<Option<String>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.user_name.is_none()
            && self.avatar_small.is_none()
            && self.avatar_medium.is_none()
            && self.avatar_full.is_none()
    }
}

pub(crate) async fn find_model<C: ConnectionTrait>(conn: &C, id: i32) -> Result<user::Model> {
    user::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::user_not_found(id))
}

async fn ownership_edges<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> Result<(Vec<UserEquipmentId>, Vec<CharacterId>)> {
    let equipment = user_equipment::Entity::find()
        .filter(user_equipment::Column::UserId.eq(user_id))
        .order_by_asc(user_equipment::Column::Id)
        .all(conn)
        .await?;
    let characters = character::Entity::find()
        .filter(character::Column::UserId.eq(user_id))
        .order_by_asc(character::Column::Id)
        .all(conn)
        .await?;

    Ok((
        equipment.iter().map(UserEquipmentId::from).collect(),
        characters.iter().map(CharacterId::from).collect(),
    ))
}

fn assemble(
    model: user::Model,
    user_equipments: Vec<UserEquipmentId>,
    characters: Vec<CharacterId>,
) -> Result<User> {
    let id = model.id;
    User::from_parts(model, user_equipments, characters)
        .map_err(|e| ServiceError::Validation(format!("User {} has a malformed avatar: {}", id, e)))
}

async fn load_with_edges<C: ConnectionTrait>(conn: &C, model: user::Model) -> Result<User> {
    let (equipment, characters) = ownership_edges(conn, model.id).await?;
    assemble(model, equipment, characters)
}

/// Writes `changes` to the user row if it is still at `expected_version`.
///
/// The version is bumped and the modification audit columns are stamped in
/// the same statement.
async fn versioned_update<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    expected_version: i32,
    mut changes: user::ActiveModel,
    actor: &str,
) -> Result<()> {
    let next_version = expected_version.checked_add(1).ok_or_else(|| {
        ServiceError::Conflict(format!("User {} has exhausted its version counter", id))
    })?;
    changes.version = Set(next_version);
    changes.last_modified_at = Set(Some(Utc::now()));
    changes.last_modified_by = Set(Some(actor.to_string()));

    let result = user::Entity::update_many()
        .set(changes)
        .filter(user::Column::Id.eq(id))
        .filter(user::Column::Version.eq(expected_version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        // Either the row is gone or it moved past the version we read
        find_model(conn, id).await?;
        warn!("Stale write to user {} rejected (expected version {})", id, expected_version);
        return Err(ServiceError::Conflict(format!(
            "User {} was modified concurrently (expected version {})",
            id, expected_version
        )));
    }

    trace!("User {} moved to version {}", id, next_version);
    Ok(())
}

/// Loads a user together with both ownership collections.
#[instrument(skip(db))]
pub async fn load_user(db: &DatabaseConnection, id: UserId) -> Result<User> {
    let model = find_model(db, id.0).await?;
    load_with_edges(db, model).await
}

/// Version the user row is at right now, or `None` once it is deleted.
#[instrument(skip(db))]
pub async fn current_version(db: &DatabaseConnection, id: UserId) -> Result<Option<i32>> {
    let model = user::Entity::find_by_id(id.0).one(db).await?;
    Ok(model.map(|m| m.version))
}

/// Loads the user registered under a Steam id.
#[instrument(skip(db))]
pub async fn find_by_steam_id(db: &DatabaseConnection, steam_id: i64) -> Result<User> {
    let model = user::Entity::find()
        .filter(user::Column::SteamId.eq(steam_id))
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound { entity: "User", id: steam_id })?;
    load_with_edges(db, model).await
}

/// Lists every user ordered by id, with ownership collections resolved in
/// two queries rather than one per user.
#[instrument(skip(db))]
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<User>> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;
    let equipment = user_equipment::Entity::find()
        .order_by_asc(user_equipment::Column::Id)
        .all(db)
        .await?;
    let characters = character::Entity::find()
        .order_by_asc(character::Column::Id)
        .all(db)
        .await?;

    let mut equipment_by_owner: HashMap<i32, Vec<UserEquipmentId>> = HashMap::new();
    for item in &equipment {
        equipment_by_owner
            .entry(item.user_id)
            .or_default()
            .push(UserEquipmentId::from(item));
    }
    let mut characters_by_owner: HashMap<i32, Vec<CharacterId>> = HashMap::new();
    for c in &characters {
        characters_by_owner
            .entry(c.user_id)
            .or_default()
            .push(CharacterId::from(c));
    }

    debug!(
        "Resolving {} users with {} equipment instances and {} characters",
        users.len(),
        equipment.len(),
        characters.len()
    );

    users
        .into_iter()
        .map(|model| {
            let id = model.id;
            assemble(
                model,
                equipment_by_owner.remove(&id).unwrap_or_default(),
                characters_by_owner.remove(&id).unwrap_or_default(),
            )
        })
        .collect()
}

/// Creates a new account. The starting balance is zero.
///
/// # Errors
///
/// * `Conflict` if the Steam id is already registered
/// * `Validation` if an avatar is not a valid URL
#[instrument(skip(db))]
pub async fn provision_user(db: &DatabaseConnection, new_user: NewUser, actor: &str) -> Result<User> {
    trace!("Provisioning user for Steam id {}", new_user.steam_id);

    parse_optional_avatar("avatar_small", new_user.avatar_small.as_deref())?;
    parse_optional_avatar("avatar_medium", new_user.avatar_medium.as_deref())?;
    parse_optional_avatar("avatar_full", new_user.avatar_full.as_deref())?;

    let existing = user::Entity::find()
        .filter(user::Column::SteamId.eq(new_user.steam_id))
        .one(db)
        .await?;
    if let Some(existing) = existing {
        warn!(
            "Steam id {} is already registered to user {}",
            new_user.steam_id, existing.id
        );
        return Err(ServiceError::Conflict(format!(
            "Steam id {} is already registered",
            new_user.steam_id
        )));
    }

    // The unique index still catches a concurrent provisioning of the same id
    let model = user::ActiveModel {
        steam_id: Set(new_user.steam_id),
        user_name: Set(new_user.user_name),
        money: Set(0),
        role: Set(new_user.role.unwrap_or_default()),
        avatar_small: Set(new_user.avatar_small),
        avatar_medium: Set(new_user.avatar_medium),
        avatar_full: Set(new_user.avatar_full),
        created_by: Set(Some(actor.to_string())),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Provisioned user {} for Steam id {}", model.id, model.steam_id);
    assemble(model, Vec::new(), Vec::new())
}

/// Platform login: returns the account for the Steam id, provisioning it on
/// first sight. For a known account the display name and avatars are
/// refreshed from the profile when they changed.
#[instrument(skip(db))]
pub async fn login(db: &DatabaseConnection, profile: NewUser, actor: &str) -> Result<User> {
    let existing = user::Entity::find()
        .filter(user::Column::SteamId.eq(profile.steam_id))
        .one(db)
        .await?;

    let Some(model) = existing else {
        debug!("First login for Steam id {}", profile.steam_id);
        let steam_id = profile.steam_id;
        return match provision_user(db, profile, actor).await {
            // A concurrent first login won the insert
            Err(ServiceError::Conflict(reason)) => {
                debug!("Steam id {} provisioned concurrently: {}", steam_id, reason);
                find_by_steam_id(db, steam_id).await
            }
            other => other,
        };
    };

    let update = ProfileUpdate {
        user_name: (model.user_name != profile.user_name).then(|| profile.user_name.clone()),
        avatar_small: (model.avatar_small != profile.avatar_small).then(|| profile.avatar_small.clone()),
        avatar_medium: (model.avatar_medium != profile.avatar_medium)
            .then(|| profile.avatar_medium.clone()),
        avatar_full: (model.avatar_full != profile.avatar_full).then(|| profile.avatar_full.clone()),
    };

    if update.is_empty() {
        debug!("Profile of user {} unchanged since last login", model.id);
        return load_with_edges(db, model).await;
    }

    update_profile(db, UserId(model.id), update, actor).await
}

/// Changes display name and avatars.
#[instrument(skip(db))]
pub async fn update_profile(
    db: &DatabaseConnection,
    id: UserId,
    update: ProfileUpdate,
    actor: &str,
) -> Result<User> {
    let current = find_model(db, id.0).await?;

    if update.is_empty() {
        debug!("No profile fields to update for user {}", id.0);
        return load_with_edges(db, current).await;
    }

    let mut changes = user::ActiveModel {
        ..Default::default()
    };
    let mut updated_fields = Vec::new();

    if let Some(user_name) = update.user_name {
        changes.user_name = Set(user_name);
        updated_fields.push("user_name");
    }
    if let Some(avatar) = update.avatar_small {
        parse_optional_avatar("avatar_small", avatar.as_deref())?;
        changes.avatar_small = Set(avatar);
        updated_fields.push("avatar_small");
    }
    if let Some(avatar) = update.avatar_medium {
        parse_optional_avatar("avatar_medium", avatar.as_deref())?;
        changes.avatar_medium = Set(avatar);
        updated_fields.push("avatar_medium");
    }
    if let Some(avatar) = update.avatar_full {
        parse_optional_avatar("avatar_full", avatar.as_deref())?;
        changes.avatar_full = Set(avatar);
        updated_fields.push("avatar_full");
    }

    versioned_update(db, id.0, current.version, changes, actor).await?;
    info!("Updated profile of user {}: {}", id.0, updated_fields.join(", "));
    load_user(db, id).await
}

/// Adds a signed amount to the user's balance.
///
/// # Errors
///
/// * `Validation` if the balance would become negative or overflow
/// * `Conflict` if another write landed between the read and the update
#[instrument(skip(db))]
pub async fn adjust_money(db: &DatabaseConnection, id: UserId, delta: i32, actor: &str) -> Result<User> {
    let txn = db.begin().await?;

    let current = find_model(&txn, id.0).await?;
    let balance = apply_money_delta(current.money, delta)?;

    let changes = user::ActiveModel {
        money: Set(balance),
        ..Default::default()
    };
    versioned_update(&txn, id.0, current.version, changes, actor).await?;
    txn.commit().await?;

    info!("Money of user {} changed by {} to {}", id.0, delta, balance);
    load_user(db, id).await
}

/// Sets the user's role.
#[instrument(skip(db))]
pub async fn change_role(db: &DatabaseConnection, id: UserId, role: Role, actor: &str) -> Result<User> {
    let current = find_model(db, id.0).await?;
    if current.role == role {
        debug!("User {} already has role {}", id.0, role);
        return load_with_edges(db, current).await;
    }

    let changes = user::ActiveModel {
        role: Set(role),
        ..Default::default()
    };
    versioned_update(db, id.0, current.version, changes, actor).await?;

    info!("Role of user {} changed from {} to {}", id.0, current.role, role);
    load_user(db, id).await
}

/// Writes the scalar fields of an in-memory record back to its row.
///
/// The ownership collections are not synchronised: dropping an id from
/// `characters` or `user_equipments` in memory never deletes or reassigns the
/// instance. Use the ownership operations for that.
#[instrument(skip(db, record), fields(user_id = record.id().0, version = record.version()))]
pub async fn persist_user(db: &DatabaseConnection, record: &User, actor: &str) -> Result<User> {
    check_balance(record.money)?;

    let changes = user::ActiveModel {
        steam_id: Set(record.steam_id),
        user_name: Set(record.user_name.clone()),
        money: Set(record.money),
        role: Set(record.role),
        avatar_small: Set(record.avatar_small.as_ref().map(|u| u.to_string())),
        avatar_medium: Set(record.avatar_medium.as_ref().map(|u| u.to_string())),
        avatar_full: Set(record.avatar_full.as_ref().map(|u| u.to_string())),
        ..Default::default()
    };
    versioned_update(db, record.id().0, record.version(), changes, actor).await?;

    info!("Persisted user {}", record.id().0);
    load_user(db, record.id()).await
}

/// Deletes an account. Characters and equipment owned by it are deleted in the
/// same transaction.
#[instrument(skip(db))]
pub async fn delete_user(db: &DatabaseConnection, id: UserId) -> Result<()> {
    let txn = db.begin().await?;

    find_model(&txn, id.0).await?;

    let characters = character::Entity::delete_many()
        .filter(character::Column::UserId.eq(id.0))
        .exec(&txn)
        .await?;
    let equipment = user_equipment::Entity::delete_many()
        .filter(user_equipment::Column::UserId.eq(id.0))
        .exec(&txn)
        .await?;
    user::Entity::delete_by_id(id.0).exec(&txn).await?;

    txn.commit().await?;

    info!(
        "Deleted user {} with {} characters and {} equipment instances",
        id.0, characters.rows_affected, equipment.rows_affected
    );
    Ok(())
}
