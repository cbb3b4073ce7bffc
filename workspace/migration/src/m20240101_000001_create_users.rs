use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(big_integer(Users::SteamId).unique_key())
                    .col(string(Users::UserName))
                    .col(integer(Users::Money).default(0))
                    .col(string_len(Users::Role, 20).default("Player"))
                    .col(string_null(Users::AvatarSmall))
                    .col(string_null(Users::AvatarMedium))
                    .col(string_null(Users::AvatarFull))
                    .col(integer(Users::Version).default(1))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .col(string_null(Users::CreatedBy))
                    .col(timestamp_with_time_zone_null(Users::LastModifiedAt))
                    .col(string_null(Users::LastModifiedBy))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    SteamId,
    UserName,
    Money,
    Role,
    AvatarSmall,
    AvatarMedium,
    AvatarFull,
    Version,
    CreatedAt,
    CreatedBy,
    LastModifiedAt,
    LastModifiedBy,
}
