use anyhow::Result;
use tracing::{info, trace};

use super::{init_database, serve};
use crate::config::Settings;

pub async fn migrate_and_serve(database_url: &str, bind_address: &str, settings: &Settings) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");

    init_database(database_url).await?;
    serve(database_url, bind_address, settings).await
}
