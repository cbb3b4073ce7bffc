//! Characters and equipment instances are created, moved and destroyed through
//! their owning user.
//!
//! Moves and deletions are conditional on the claimed owner, so an instance
//! that changed hands in the meantime is never touched.

use chrono::Utc;
use model::entities::{character, user_equipment};
use model::{CharacterId, UserEquipmentId, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, ServiceError};
use crate::users::find_model;

/// Characters owned by a user, in creation order.
#[instrument(skip(db))]
pub async fn list_characters(db: &DatabaseConnection, owner: UserId) -> Result<Vec<character::Model>> {
    find_model(db, owner.0).await?;

    let characters = character::Entity::find()
        .filter(character::Column::UserId.eq(owner.0))
        .order_by_asc(character::Column::Id)
        .all(db)
        .await?;
    debug!("User {} owns {} characters", owner.0, characters.len());
    Ok(characters)
}

/// Creates a character owned by `owner`.
#[instrument(skip(db))]
pub async fn create_character(
    db: &DatabaseConnection,
    owner: UserId,
    name: &str,
    actor: &str,
) -> Result<character::Model> {
    find_model(db, owner.0).await?;

    let created = character::ActiveModel {
        user_id: Set(owner.0),
        name: Set(name.to_string()),
        created_by: Set(Some(actor.to_string())),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created character {} '{}' for user {}", created.id, created.name, owner.0);
    Ok(created)
}

/// Moves a character from one user to another.
///
/// # Errors
///
/// * `NotFound` if the character or the receiving user does not exist
/// * `Ownership` if `from` does not own the character at the time of the move
#[instrument(skip(db))]
pub async fn transfer_character(
    db: &DatabaseConnection,
    id: CharacterId,
    from: UserId,
    to: UserId,
    actor: &str,
) -> Result<character::Model> {
    let txn = db.begin().await?;

    let current = character::Entity::find_by_id(id.0)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::character_not_found(id.0))?;
    if current.user_id != from.0 {
        warn!(
            "Character {} is owned by user {}, not by user {}",
            id.0, current.user_id, from.0
        );
        return Err(ServiceError::Ownership(format!(
            "Character {} is not owned by user {}",
            id.0, from.0
        )));
    }
    find_model(&txn, to.0).await?;

    if from == to {
        debug!("Character {} already belongs to user {}", id.0, to.0);
        return Ok(current);
    }

    let moved = character::Entity::update_many()
        .set(character::ActiveModel {
            user_id: Set(to.0),
            last_modified_at: Set(Some(Utc::now())),
            last_modified_by: Set(Some(actor.to_string())),
            ..Default::default()
        })
        .filter(character::Column::Id.eq(id.0))
        .filter(character::Column::UserId.eq(from.0))
        .exec(&txn)
        .await?;
    if moved.rows_affected == 0 {
        return Err(ServiceError::Ownership(format!(
            "Character {} changed owner during transfer",
            id.0
        )));
    }

    let updated = character::Entity::find_by_id(id.0)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::character_not_found(id.0))?;
    txn.commit().await?;

    info!("Transferred character {} from user {} to user {}", id.0, from.0, to.0);
    Ok(updated)
}

/// Destroys a character through its owner.
#[instrument(skip(db))]
pub async fn delete_character(db: &DatabaseConnection, owner: UserId, id: CharacterId) -> Result<()> {
    let deleted = character::Entity::delete_many()
        .filter(character::Column::Id.eq(id.0))
        .filter(character::Column::UserId.eq(owner.0))
        .exec(db)
        .await?;

    if deleted.rows_affected == 0 {
        return match character::Entity::find_by_id(id.0).one(db).await? {
            None => Err(ServiceError::character_not_found(id.0)),
            Some(_) => Err(ServiceError::Ownership(format!(
                "Character {} is not owned by user {}",
                id.0, owner.0
            ))),
        };
    }

    info!("Deleted character {} of user {}", id.0, owner.0);
    Ok(())
}

/// Equipment instances owned by a user, in acquisition order.
#[instrument(skip(db))]
pub async fn list_user_equipments(
    db: &DatabaseConnection,
    owner: UserId,
) -> Result<Vec<user_equipment::Model>> {
    find_model(db, owner.0).await?;

    let equipment = user_equipment::Entity::find()
        .filter(user_equipment::Column::UserId.eq(owner.0))
        .order_by_asc(user_equipment::Column::Id)
        .all(db)
        .await?;
    debug!("User {} owns {} equipment instances", owner.0, equipment.len());
    Ok(equipment)
}

/// Gives `owner` a new equipment instance.
#[instrument(skip(db))]
pub async fn grant_equipment(
    db: &DatabaseConnection,
    owner: UserId,
    name: &str,
    actor: &str,
) -> Result<user_equipment::Model> {
    find_model(db, owner.0).await?;

    let granted = user_equipment::ActiveModel {
        user_id: Set(owner.0),
        name: Set(name.to_string()),
        created_by: Set(Some(actor.to_string())),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Granted equipment {} '{}' to user {}", granted.id, granted.name, owner.0);
    Ok(granted)
}

/// Moves an equipment instance from one user to another.
///
/// # Errors
///
/// * `NotFound` if the instance or the receiving user does not exist
/// * `Ownership` if `from` does not own the instance at the time of the move
#[instrument(skip(db))]
pub async fn transfer_equipment(
    db: &DatabaseConnection,
    id: UserEquipmentId,
    from: UserId,
    to: UserId,
    actor: &str,
) -> Result<user_equipment::Model> {
    let txn = db.begin().await?;

    let current = user_equipment::Entity::find_by_id(id.0)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::equipment_not_found(id.0))?;
    if current.user_id != from.0 {
        warn!(
            "Equipment {} is owned by user {}, not by user {}",
            id.0, current.user_id, from.0
        );
        return Err(ServiceError::Ownership(format!(
            "Equipment {} is not owned by user {}",
            id.0, from.0
        )));
    }
    find_model(&txn, to.0).await?;

    if from == to {
        debug!("Equipment {} already belongs to user {}", id.0, to.0);
        return Ok(current);
    }

    let moved = user_equipment::Entity::update_many()
        .set(user_equipment::ActiveModel {
            user_id: Set(to.0),
            last_modified_at: Set(Some(Utc::now())),
            last_modified_by: Set(Some(actor.to_string())),
            ..Default::default()
        })
        .filter(user_equipment::Column::Id.eq(id.0))
        .filter(user_equipment::Column::UserId.eq(from.0))
        .exec(&txn)
        .await?;
    if moved.rows_affected == 0 {
        return Err(ServiceError::Ownership(format!(
            "Equipment {} changed owner during transfer",
            id.0
        )));
    }

    let updated = user_equipment::Entity::find_by_id(id.0)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::equipment_not_found(id.0))?;
    txn.commit().await?;

    info!("Transferred equipment {} from user {} to user {}", id.0, from.0, to.0);
    Ok(updated)
}

/// Destroys an equipment instance through its owner.
#[instrument(skip(db))]
pub async fn remove_equipment(db: &DatabaseConnection, owner: UserId, id: UserEquipmentId) -> Result<()> {
    let deleted = user_equipment::Entity::delete_many()
        .filter(user_equipment::Column::Id.eq(id.0))
        .filter(user_equipment::Column::UserId.eq(owner.0))
        .exec(db)
        .await?;

    if deleted.rows_affected == 0 {
        return match user_equipment::Entity::find_by_id(id.0).one(db).await? {
            None => Err(ServiceError::equipment_not_found(id.0)),
            Some(_) => Err(ServiceError::Ownership(format!(
                "Equipment {} is not owned by user {}",
                id.0, owner.0
            ))),
        };
    }

    info!("Removed equipment {} from user {}", id.0, owner.0);
    Ok(())
}
