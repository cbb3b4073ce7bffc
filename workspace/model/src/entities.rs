//! Root of the SeaORM entity modules.
//! A user owns characters and equipment instances; both point back at their
//! owner through a non-null `user_id`, so an instance always has exactly one owner.

pub mod character;
pub mod user;
pub mod user_equipment;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::character::Entity as Character;
    pub use super::user::Entity as User;
    pub use super::user_equipment::Entity as UserEquipment;
}
