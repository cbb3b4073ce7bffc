use model::{CharacterId, Role, UserId};

use super::helpers::{new_character, new_equipment, new_user, ACTOR};
use super::{setup_db, ScenarioAlice, TestScenarioBuilder};
use crate::error::ServiceError;
use crate::users::{
    adjust_money, change_role, delete_user, find_by_steam_id, list_users, load_user, login,
    persist_user, provision_user, update_profile, NewUser, ProfileUpdate,
};

fn steam_profile(steam_id: i64, name: &str) -> NewUser {
    NewUser {
        steam_id,
        user_name: name.to_string(),
        avatar_small: Some("https://avatars.example.com/s.jpg".to_string()),
        avatar_medium: Some("https://avatars.example.com/m.jpg".to_string()),
        avatar_full: Some("https://avatars.example.com/f.jpg".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_provision_creates_empty_account() {
    let db = setup_db().await.unwrap();

    let user = provision_user(&db, steam_profile(76561198000000042, "Carol"), "steam-login")
        .await
        .unwrap();

    assert!(user.id().0 > 0);
    assert_eq!(user.version(), 1);
    assert_eq!(user.money, 0);
    assert_eq!(user.role, Role::Player);
    assert_eq!(
        user.avatar_full.as_ref().map(|u| u.as_str()),
        Some("https://avatars.example.com/f.jpg")
    );
    assert!(user.characters.is_empty());
    assert!(user.user_equipments.is_empty());
    assert_eq!(user.audit.created_by.as_deref(), Some("steam-login"));
    assert!(user.audit.last_modified_at.is_none());
}

#[tokio::test]
async fn test_provision_without_avatars() {
    let db = setup_db().await.unwrap();

    let user = provision_user(
        &db,
        NewUser {
            steam_id: 76561198000000043,
            user_name: "NoPics".to_string(),
            ..Default::default()
        },
        ACTOR,
    )
    .await
    .unwrap();

    assert!(user.avatar_small.is_none());
    assert!(user.avatar_medium.is_none());
    assert!(user.avatar_full.is_none());
}

#[tokio::test]
async fn test_provision_rejects_duplicate_steam_id() {
    let db = setup_db().await.unwrap();

    provision_user(&db, steam_profile(76561198000000044, "Dan"), ACTOR)
        .await
        .unwrap();
    let duplicate = provision_user(&db, steam_profile(76561198000000044, "Dan again"), ACTOR).await;

    assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));
}

#[tokio::test]
async fn test_provision_rejects_malformed_avatar() {
    let db = setup_db().await.unwrap();

    let mut profile = steam_profile(76561198000000045, "Eve");
    profile.avatar_medium = Some("not a url".to_string());

    let result = provision_user(&db, profile, ACTOR).await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));
    assert!(list_users(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_login_provisions_then_refreshes_profile() {
    let db = setup_db().await.unwrap();

    let first = login(&db, steam_profile(76561198000000046, "Frank"), "steam-login")
        .await
        .unwrap();

    // Same profile again: nothing to write
    let same = login(&db, steam_profile(76561198000000046, "Frank"), "steam-login")
        .await
        .unwrap();
    assert_eq!(same.id(), first.id());
    assert_eq!(same.version(), first.version());

    let mut renamed = steam_profile(76561198000000046, "Frankie");
    renamed.avatar_small = None;
    let refreshed = login(&db, renamed, "steam-login").await.unwrap();

    assert_eq!(refreshed.id(), first.id());
    assert_eq!(refreshed.user_name, "Frankie");
    assert!(refreshed.avatar_small.is_none());
    assert!(refreshed.avatar_full.is_some());
    assert_eq!(refreshed.version(), first.version() + 1);
    assert_eq!(list_users(&db).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_alice_scenario_loads_exactly_her_character() {
    let (db, users, characters) = ScenarioAlice::new().get_scenario().await.unwrap();
    let alice = &users[0];
    let c1 = CharacterId(characters[0].id);

    let user = load_user(&db, UserId(alice.id)).await.unwrap();
    assert_eq!(user.user_name, "Alice");
    assert_eq!(user.steam_id, ScenarioAlice::STEAM_ID);
    assert_eq!(user.money, 100);
    assert_eq!(user.role, Role::Player);
    assert_eq!(user.characters, vec![c1]);
    assert!(user.user_equipments.is_empty());

    let by_steam = find_by_steam_id(&db, ScenarioAlice::STEAM_ID).await.unwrap();
    assert_eq!(by_steam, user);
}

#[tokio::test]
async fn test_removing_character_in_memory_keeps_the_row() {
    let (db, users, characters) = ScenarioAlice::new().get_scenario().await.unwrap();
    let c1 = CharacterId(characters[0].id);

    let mut user = load_user(&db, UserId(users[0].id)).await.unwrap();
    assert!(user.remove_character(c1));
    user.money = 150;

    let persisted = persist_user(&db, &user, ACTOR).await.unwrap();

    // Collections are derived from the owning key, so the character is still Alice's
    assert_eq!(persisted.money, 150);
    assert_eq!(persisted.characters, vec![c1]);
    assert_eq!(persisted.id(), user.id());
}

#[tokio::test]
async fn test_persist_rejects_negative_money() {
    let (db, users, _) = ScenarioAlice::new().get_scenario().await.unwrap();

    let mut user = load_user(&db, UserId(users[0].id)).await.unwrap();
    user.money = -1;

    let result = persist_user(&db, &user, ACTOR).await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));
    assert_eq!(load_user(&db, user.id()).await.unwrap().money, 100);
}

#[tokio::test]
async fn test_adjust_money_never_goes_negative() {
    let (db, users, _) = ScenarioAlice::new().get_scenario().await.unwrap();
    let id = UserId(users[0].id);

    let spent = adjust_money(&db, id, -60, "shop").await.unwrap();
    assert_eq!(spent.money, 40);
    assert_eq!(spent.audit.last_modified_by.as_deref(), Some("shop"));

    let overdraft = adjust_money(&db, id, -41, "shop").await;
    assert!(matches!(overdraft, Err(ServiceError::Validation(_))));

    let emptied = adjust_money(&db, id, -40, "shop").await.unwrap();
    assert_eq!(emptied.money, 0);
}

#[tokio::test]
async fn test_adjust_money_of_missing_user() {
    let db = setup_db().await.unwrap();

    let result = adjust_money(&db, UserId(999), 10, ACTOR).await;
    assert!(matches!(result, Err(ServiceError::NotFound { entity: "User", id: 999 })));
}

#[tokio::test]
async fn test_change_role_updates_audit() {
    let db = setup_db().await.unwrap();
    let bob = new_user(&db, "Bob").await.unwrap();

    let promoted = change_role(&db, UserId(bob.id), Role::Moderator, "admin")
        .await
        .unwrap();

    assert_eq!(promoted.role, Role::Moderator);
    assert_eq!(promoted.version(), 2);
    assert_eq!(promoted.audit.created_by.as_deref(), Some(ACTOR));
    assert_eq!(promoted.audit.created_at, bob.created_at);
    assert_eq!(promoted.audit.last_modified_by.as_deref(), Some("admin"));
    assert!(promoted.audit.last_modified_at.is_some());

    // Same role again leaves the row alone
    let unchanged = change_role(&db, UserId(bob.id), Role::Moderator, "admin")
        .await
        .unwrap();
    assert_eq!(unchanged.version(), 2);
}

#[tokio::test]
async fn test_update_profile_clears_and_validates_avatars() {
    let db = setup_db().await.unwrap();
    let user = provision_user(&db, steam_profile(76561198000000047, "Gina"), ACTOR)
        .await
        .unwrap();

    let cleared = update_profile(
        &db,
        user.id(),
        ProfileUpdate {
            avatar_full: Some(None),
            ..Default::default()
        },
        ACTOR,
    )
    .await
    .unwrap();
    assert!(cleared.avatar_full.is_none());
    assert!(cleared.avatar_small.is_some());

    let invalid = update_profile(
        &db,
        user.id(),
        ProfileUpdate {
            avatar_small: Some(Some("::".to_string())),
            ..Default::default()
        },
        ACTOR,
    )
    .await;
    assert!(matches!(invalid, Err(ServiceError::Validation(_))));
}

#[tokio::test]
async fn test_delete_user_cascades_to_owned_instances() {
    let db = setup_db().await.unwrap();
    let owner = new_user(&db, "Hank").await.unwrap();
    let other = new_user(&db, "Ivy").await.unwrap();
    new_character(&db, &owner, "Hero").await.unwrap();
    new_equipment(&db, &owner, "Helmet").await.unwrap();
    let kept = new_character(&db, &other, "Kept").await.unwrap();

    delete_user(&db, UserId(owner.id)).await.unwrap();

    assert!(matches!(
        load_user(&db, UserId(owner.id)).await,
        Err(ServiceError::NotFound { .. })
    ));
    let survivor = load_user(&db, UserId(other.id)).await.unwrap();
    assert_eq!(survivor.characters, vec![CharacterId(kept.id)]);

    let again = delete_user(&db, UserId(owner.id)).await;
    assert!(matches!(again, Err(ServiceError::NotFound { .. })));
}

#[tokio::test]
async fn test_list_users_resolves_collections_per_owner() {
    let db = setup_db().await.unwrap();
    let a = new_user(&db, "A").await.unwrap();
    let b = new_user(&db, "B").await.unwrap();
    let a1 = new_character(&db, &a, "A1").await.unwrap();
    let b1 = new_character(&db, &b, "B1").await.unwrap();
    let b2 = new_character(&db, &b, "B2").await.unwrap();
    let a_gear = new_equipment(&db, &a, "Bow").await.unwrap();

    let users = list_users(&db).await.unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id(), UserId(a.id));
    assert_eq!(users[0].characters, vec![CharacterId(a1.id)]);
    assert_eq!(users[0].user_equipments.len(), 1);
    assert_eq!(users[0].user_equipments[0].0, a_gear.id);
    assert_eq!(users[1].characters, vec![CharacterId(b1.id), CharacterId(b2.id)]);
    assert!(users[1].user_equipments.is_empty());
}
