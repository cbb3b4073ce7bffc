use sea_orm::entity::prelude::*;

use crate::audit::{self, AuditInfo, Auditable};

/// A player character. Belongs to exactly one user for its whole lifetime
/// unless explicitly transferred.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "characters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// The owning user.
    pub user_id: i32,
    pub name: String,
    pub created_at: DateTimeUtc,
    pub created_by: Option<String>,
    pub last_modified_at: Option<DateTimeUtc>,
    pub last_modified_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
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
