use anyhow::Result;
use ::config::{Config, Environment, File};
use moka::future::Cache;
use sea_orm::{ConnectOptions, Database};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::schemas::AppState;

/// Runtime settings, layered from defaults, an optional `trpg.{toml,yaml,json}`
/// file and `TRPG_*` environment variables. CLI arguments override all of them.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    /// Maximum number of cached user payloads
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = Config::builder()
            .set_default("database_url", "sqlite://trpg.db?mode=rwc")?
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("cache_capacity", 1000_i64)?
            .set_default("cache_ttl_secs", 300_i64)?
            .add_source(File::with_name("trpg").required(false))
            .add_source(Environment::with_prefix("TRPG"))
            .build()?
            .try_deserialize::<Settings>()?;

        debug!(?settings, "Loaded settings");
        Ok(settings)
    }
}

/// Connect to the database and build the shared handler state.
pub async fn initialize_app_state_with_url(database_url: &str, settings: &Settings) -> Result<AppState> {
    info!("Connecting to database: {}", database_url);
    let mut options = ConnectOptions::new(database_url.to_string());
    options.sqlx_logging(false);
    let db = Database::connect(options).await?;

    let cache = Cache::builder()
        .max_capacity(settings.cache_capacity)
        .time_to_live(Duration::from_secs(settings.cache_ttl_secs))
        .build();

    Ok(AppState { db, cache })
}
