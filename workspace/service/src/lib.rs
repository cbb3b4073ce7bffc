//! Persistence and service layer for accounts and the instances they own.
//!
//! Records in `model` are passive; this crate assigns identities, enforces
//! uniqueness and ownership, keeps balances non-negative and serialises
//! concurrent writers through the user row's version.

pub mod error;
pub mod ownership;
pub mod users;
pub mod validation;

#[cfg(test)]
pub mod testing;

pub use error::{Result, ServiceError};
pub use users::{NewUser, ProfileUpdate};
