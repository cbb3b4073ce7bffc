#[cfg(test)]
pub mod test_utils {
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use migration::{Migrator, MigratorTrait};
    use moka::future::Cache;
    use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Create an in-memory SQLite database with the schema applied
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        db.execute_unprepared("PRAGMA foreign_keys = ON;")
            .await
            .expect("Failed to enable foreign keys");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;
        let cache = Cache::new(100);
        AppState { db, cache }
    }

    /// Tracing for tests, written to STDERR.
    ///
    /// The level comes from RUST_LOG and defaults to WARN. The returned guard
    /// must be held for the subscriber to stay active.
    pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Router over a fresh database, plus the state so tests can inspect the cache.
    pub async fn setup_test_app() -> (Router, AppState) {
        let state = setup_test_app_state().await;
        let router = create_router(state.clone());
        (router, state)
    }
}
