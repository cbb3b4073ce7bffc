pub mod audit;
pub mod entities;
pub mod user;

pub use audit::{AuditInfo, Auditable};
pub use entities::user::Role;
pub use user::{CharacterId, User, UserEquipmentId, UserId};
