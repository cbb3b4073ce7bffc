pub mod helpers;

mod test_concurrency;
mod test_lifecycle;
mod test_ownership;

pub use scenario_alice::ScenarioAlice;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr};

use migration::{Migrator, MigratorTrait};
use model::entities::{character, user};

pub async fn setup_db() -> Result<DatabaseConnection, DbErr> {
    // Connect to the SQLite database
    let db = Database::connect("sqlite::memory:").await?;

    // Enable foreign keys
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

    Migrator::up(&db, None).await.expect("Migrations failed.");
    Ok(db)
}

/// Prepared test scenario: the database plus the users and characters it was seeded with.
pub type TestScenario = (DatabaseConnection, Vec<user::Model>, Vec<character::Model>);

/// Trait for building test scenarios.
#[async_trait]
pub trait TestScenarioBuilder {
    async fn get_scenario(&self) -> Result<TestScenario, DbErr>;
}
