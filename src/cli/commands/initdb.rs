use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{info, debug, trace, error};

pub async fn init_database(database_url: &str) -> Result<()> {
    trace!("Entering init_database function");
    info!("Initializing database");
    debug!("Database URL: {}", database_url);

    let mut options = ConnectOptions::new(database_url.to_string());
    options.sqlx_logging(false);

    trace!("Attempting to connect to database");
    let db: DatabaseConnection = match Database::connect(options).await {
        Ok(connection) => {
            info!("Successfully connected to database");
            debug!("Database connection established");
            connection
        }
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            return Err(e.into());
        }
    };

    info!("Running database migrations");
    trace!("Executing migration up command");
    match Migrator::up(&db, None).await {
        Ok(_) => {
            info!("Database migrations completed successfully");
            debug!("All pending migrations have been applied");
        }
        Err(e) => {
            error!("Failed to run database migrations: {}", e);
            return Err(e.into());
        }
    }

    let pending = Migrator::get_pending_migrations(&db).await?;
    debug!("{} migrations still pending", pending.len());

    info!("Database initialization completed successfully!");

    Ok(())
}
