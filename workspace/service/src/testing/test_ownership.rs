use model::entities::{character, user_equipment};
use model::{CharacterId, UserEquipmentId, UserId};
use sea_orm::EntityTrait;

use super::helpers::{new_character, new_equipment, new_user, ACTOR};
use super::{setup_db, ScenarioAlice, TestScenarioBuilder};
use crate::error::ServiceError;
use crate::ownership::{
    create_character, delete_character, grant_equipment, list_characters, list_user_equipments,
    remove_equipment, transfer_character, transfer_equipment,
};
use crate::users::load_user;

#[tokio::test]
async fn test_every_owned_instance_resolves_back_to_its_owner() {
    let db = setup_db().await.unwrap();
    let owner = new_user(&db, "Owner").await.unwrap();
    create_character(&db, UserId(owner.id), "Knight", ACTOR).await.unwrap();
    create_character(&db, UserId(owner.id), "Mage", ACTOR).await.unwrap();
    grant_equipment(&db, UserId(owner.id), "Staff", ACTOR).await.unwrap();

    let user = load_user(&db, UserId(owner.id)).await.unwrap();
    assert_eq!(user.characters.len(), 2);
    assert_eq!(user.user_equipments.len(), 1);

    for id in &user.characters {
        let row = character::Entity::find_by_id(id.0).one(&db).await.unwrap().unwrap();
        assert_eq!(UserId(row.user_id), user.id());
    }
    for id in &user.user_equipments {
        let row = user_equipment::Entity::find_by_id(id.0).one(&db).await.unwrap().unwrap();
        assert_eq!(UserId(row.user_id), user.id());
    }
}

#[tokio::test]
async fn test_create_for_missing_owner() {
    let db = setup_db().await.unwrap();

    let character = create_character(&db, UserId(404), "Ghost", ACTOR).await;
    assert!(matches!(character, Err(ServiceError::NotFound { entity: "User", .. })));

    let equipment = grant_equipment(&db, UserId(404), "Ghost blade", ACTOR).await;
    assert!(matches!(equipment, Err(ServiceError::NotFound { entity: "User", .. })));
}

#[tokio::test]
async fn test_transfer_character_moves_ownership() {
    let (db, users, characters) = ScenarioAlice::new().get_scenario().await.unwrap();
    let alice = UserId(users[0].id);
    let c1 = CharacterId(characters[0].id);
    let bob = UserId(new_user(&db, "Bob").await.unwrap().id);

    let moved = transfer_character(&db, c1, alice, bob, "trade").await.unwrap();
    assert_eq!(moved.user_id, bob.0);
    assert_eq!(moved.last_modified_by.as_deref(), Some("trade"));
    assert_eq!(moved.created_at, characters[0].created_at);

    assert!(load_user(&db, alice).await.unwrap().characters.is_empty());
    assert_eq!(load_user(&db, bob).await.unwrap().characters, vec![c1]);
}

#[tokio::test]
async fn test_transfer_from_wrong_owner_is_rejected() {
    let (db, users, characters) = ScenarioAlice::new().get_scenario().await.unwrap();
    let alice = UserId(users[0].id);
    let c1 = CharacterId(characters[0].id);
    let bob = UserId(new_user(&db, "Bob").await.unwrap().id);
    let mallory = UserId(new_user(&db, "Mallory").await.unwrap().id);

    let result = transfer_character(&db, c1, mallory, bob, ACTOR).await;
    assert!(matches!(result, Err(ServiceError::Ownership(_))));
    assert_eq!(load_user(&db, alice).await.unwrap().characters, vec![c1]);
}

#[tokio::test]
async fn test_transfer_to_missing_user_or_missing_character() {
    let (db, users, characters) = ScenarioAlice::new().get_scenario().await.unwrap();
    let alice = UserId(users[0].id);
    let c1 = CharacterId(characters[0].id);

    let to_missing = transfer_character(&db, c1, alice, UserId(999), ACTOR).await;
    assert!(matches!(to_missing, Err(ServiceError::NotFound { entity: "User", .. })));

    let missing = transfer_character(&db, CharacterId(999), alice, alice, ACTOR).await;
    assert!(matches!(missing, Err(ServiceError::NotFound { entity: "Character", .. })));
}

#[tokio::test]
async fn test_delete_character_through_owner_only() {
    let (db, users, characters) = ScenarioAlice::new().get_scenario().await.unwrap();
    let alice = UserId(users[0].id);
    let c1 = CharacterId(characters[0].id);
    let bob = UserId(new_user(&db, "Bob").await.unwrap().id);

    let by_stranger = delete_character(&db, bob, c1).await;
    assert!(matches!(by_stranger, Err(ServiceError::Ownership(_))));

    delete_character(&db, alice, c1).await.unwrap();
    assert!(list_characters(&db, alice).await.unwrap().is_empty());

    let gone = delete_character(&db, alice, c1).await;
    assert!(matches!(gone, Err(ServiceError::NotFound { entity: "Character", .. })));
}

#[tokio::test]
async fn test_equipment_grant_transfer_and_remove() {
    let db = setup_db().await.unwrap();
    let giver = new_user(&db, "Giver").await.unwrap();
    let taker = new_user(&db, "Taker").await.unwrap();
    let sword = grant_equipment(&db, UserId(giver.id), "Sword", ACTOR).await.unwrap();
    let shield = new_equipment(&db, &giver, "Shield").await.unwrap();

    let listed = list_user_equipments(&db, UserId(giver.id)).await.unwrap();
    assert_eq!(listed, vec![sword.clone(), shield.clone()]);

    let moved = transfer_equipment(
        &db,
        UserEquipmentId(sword.id),
        UserId(giver.id),
        UserId(taker.id),
        ACTOR,
    )
    .await
    .unwrap();
    assert_eq!(moved.user_id, taker.id);

    let wrong_owner = remove_equipment(&db, UserId(giver.id), UserEquipmentId(sword.id)).await;
    assert!(matches!(wrong_owner, Err(ServiceError::Ownership(_))));

    remove_equipment(&db, UserId(taker.id), UserEquipmentId(sword.id))
        .await
        .unwrap();

    let giver_record = load_user(&db, UserId(giver.id)).await.unwrap();
    assert_eq!(giver_record.user_equipments, vec![UserEquipmentId(shield.id)]);
    assert!(list_user_equipments(&db, UserId(taker.id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_transfer_to_self_is_a_no_op() {
    let db = setup_db().await.unwrap();
    let owner = new_user(&db, "Solo").await.unwrap();
    let hero = new_character(&db, &owner, "Hero").await.unwrap();

    let same = transfer_character(&db, CharacterId(hero.id), UserId(owner.id), UserId(owner.id), ACTOR)
        .await
        .unwrap();

    assert_eq!(same, hero);
}
