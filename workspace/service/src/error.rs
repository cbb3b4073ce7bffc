use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::error;

/// Error types raised at the persistence/service boundary.
///
/// Records themselves never fail; every rule about users and their owned
/// instances is checked here and surfaced to the caller unchanged.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No row with the given key exists
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Duplicate identity or a concurrent writer got there first
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input that would break a record invariant
    #[error("Validation error: {0}")]
    Validation(String),

    /// An instance is not owned by the user the caller claimed
    #[error("Ownership error: {0}")]
    Ownership(String),

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(DbErr),
}

impl ServiceError {
    pub fn user_not_found(id: i32) -> Self {
        ServiceError::NotFound { entity: "User", id: id as i64 }
    }

    pub fn character_not_found(id: i32) -> Self {
        ServiceError::NotFound { entity: "Character", id: id as i64 }
    }

    pub fn equipment_not_found(id: i32) -> Self {
        ServiceError::NotFound { entity: "UserEquipment", id: id as i64 }
    }

    /// Stable machine-readable code for API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound { .. } => "NOT_FOUND",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::Ownership(_) => "OWNERSHIP_ERROR",
            ServiceError::Database(_) => "DATABASE_ERROR",
        }
    }
}

// Unique-constraint violations surface as conflicts rather than raw database errors.
impl From<DbErr> for ServiceError {
    fn from(error: DbErr) -> Self {
        match error.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                let err = ServiceError::Conflict(format!("Unique constraint violated: {}", detail));
                error!(?err, "Database error: unique constraint");
                err
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                let err = ServiceError::Validation(format!("Foreign key violated: {}", detail));
                error!(?err, "Database error: foreign key");
                err
            }
            _ => {
                error!(%error, "Database error");
                ServiceError::Database(error)
            }
        }
    }
}

/// Type alias for Result with ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;
