use model::entities::prelude::*;
use model::entities::{character, user, user_equipment};
use sea_orm::EntityTrait;
use sea_orm_migration::{prelude::*, schema::*};

use crate::entity_iden::EntityIden;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Column set shared by every table whose rows are owned by a user.
struct OwnedColumns<E: EntityTrait> {
    id: E::Column,
    user_id: E::Column,
    name: E::Column,
    created_at: E::Column,
    created_by: E::Column,
    last_modified_at: E::Column,
    last_modified_by: E::Column,
}

fn create_owned_table<E: EntityIden>(columns: OwnedColumns<E>, fk_name: &str) -> TableCreateStatement {
    Table::create()
        .table(E::table())
        .if_not_exists()
        .col(pk_auto(E::column(columns.id)))
        .col(integer(E::column(columns.user_id)))
        .col(string(E::column(columns.name)))
        .col(timestamp_with_time_zone(E::column(columns.created_at)))
        .col(string_null(E::column(columns.created_by)))
        .col(timestamp_with_time_zone_null(E::column(columns.last_modified_at)))
        .col(string_null(E::column(columns.last_modified_by)))
        .foreign_key(
            ForeignKey::create()
                .name(fk_name)
                .from(E::table(), E::column(columns.user_id))
                .to(User::table(), User::column(user::Column::Id))
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

fn owner_index<E: EntityIden>(name: &str, user_id: E::Column) -> IndexCreateStatement {
    Index::create()
        .name(name)
        .table(E::table())
        .col(E::column(user_id))
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(create_owned_table::<Character>(
                OwnedColumns {
                    id: character::Column::Id,
                    user_id: character::Column::UserId,
                    name: character::Column::Name,
                    created_at: character::Column::CreatedAt,
                    created_by: character::Column::CreatedBy,
                    last_modified_at: character::Column::LastModifiedAt,
                    last_modified_by: character::Column::LastModifiedBy,
                },
                "fk_characters_user",
            ))
            .await?;

        manager
            .create_index(owner_index::<Character>(
                "idx_characters_user_id",
                character::Column::UserId,
            ))
            .await?;

        manager
            .create_table(create_owned_table::<UserEquipment>(
                OwnedColumns {
                    id: user_equipment::Column::Id,
                    user_id: user_equipment::Column::UserId,
                    name: user_equipment::Column::Name,
                    created_at: user_equipment::Column::CreatedAt,
                    created_by: user_equipment::Column::CreatedBy,
                    last_modified_at: user_equipment::Column::LastModifiedAt,
                    last_modified_by: user_equipment::Column::LastModifiedBy,
                },
                "fk_user_equipments_user",
            ))
            .await?;

        manager
            .create_index(owner_index::<UserEquipment>(
                "idx_user_equipments_user_id",
                user_equipment::Column::UserId,
            ))
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserEquipment::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Character::table()).to_owned())
            .await
    }
}
