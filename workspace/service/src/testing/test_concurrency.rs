use model::entities::user;
use model::UserId;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

use super::{setup_db, ScenarioAlice, TestScenarioBuilder};
use super::helpers::{next_steam_id, ACTOR};
use crate::error::ServiceError;
use crate::users::{adjust_money, list_users, load_user, login, persist_user, NewUser};

#[tokio::test]
async fn test_stale_record_cannot_overwrite_newer_write() {
    let (db, users, _) = ScenarioAlice::new().get_scenario().await.unwrap();
    let id = UserId(users[0].id);

    let mut first = load_user(&db, id).await.unwrap();
    let mut second = load_user(&db, id).await.unwrap();

    first.money = 10;
    persist_user(&db, &first, ACTOR).await.unwrap();

    // Read before the first write landed, so its version is stale
    second.money = 1_000;
    let result = persist_user(&db, &second, ACTOR).await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));

    let stored = load_user(&db, id).await.unwrap();
    assert_eq!(stored.money, 10);
    assert_eq!(stored.version(), first.version() + 1);
}

#[tokio::test]
async fn test_money_changes_do_not_lose_updates() {
    let (db, users, _) = ScenarioAlice::new().get_scenario().await.unwrap();
    let id = UserId(users[0].id);

    let stale = load_user(&db, id).await.unwrap();
    adjust_money(&db, id, 25, "quest").await.unwrap();
    adjust_money(&db, id, -5, "shop").await.unwrap();

    let stored = load_user(&db, id).await.unwrap();
    assert_eq!(stored.money, 120);
    assert_eq!(stored.version(), stale.version() + 2);

    // A record read before both changes must not clobber them
    let result = persist_user(&db, &stale, ACTOR).await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));
}

#[tokio::test]
async fn test_persisting_deleted_user_reports_not_found() {
    let (db, users, _) = ScenarioAlice::new().get_scenario().await.unwrap();
    let id = UserId(users[0].id);

    let record = load_user(&db, id).await.unwrap();
    crate::users::delete_user(&db, id).await.unwrap();

    let result = persist_user(&db, &record, ACTOR).await;
    assert!(matches!(result, Err(ServiceError::NotFound { .. })));
}

#[tokio::test]
async fn test_overlapping_first_logins_share_one_account() {
    let db = setup_db().await.unwrap();
    let profile = NewUser {
        steam_id: next_steam_id(),
        user_name: "Dana".to_string(),
        ..Default::default()
    };

    let (first, second) = tokio::join!(
        login(&db, profile.clone(), ACTOR),
        login(&db, profile.clone(), ACTOR)
    );

    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(first.id(), second.id());
    assert_eq!(list_users(&db).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_exhausted_version_counter_is_a_conflict() {
    let (db, users, _) = ScenarioAlice::new().get_scenario().await.unwrap();
    let id = UserId(users[0].id);

    user::Entity::update_many()
        .set(user::ActiveModel {
            version: Set(i32::MAX),
            ..Default::default()
        })
        .filter(user::Column::Id.eq(id.0))
        .exec(&db)
        .await
        .unwrap();

    let mut record = load_user(&db, id).await.unwrap();
    assert_eq!(record.version(), i32::MAX);

    record.money = 5;
    let result = persist_user(&db, &record, ACTOR).await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));
    assert_eq!(load_user(&db, id).await.unwrap().money, 100);
}
