use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace};

use crate::config::{initialize_app_state_with_url, Settings};
use crate::router::create_router;

pub async fn serve(database_url: &str, bind_address: &str, settings: &Settings) -> Result<()> {
    trace!("Entering serve function");
    info!("TRPG account service starting up");
    debug!("Database URL: {}", database_url);
    debug!("Bind address: {}", bind_address);

    trace!("Initializing application state");
    let state = match initialize_app_state_with_url(database_url, settings).await {
        Ok(state) => {
            debug!("Application state initialized successfully");
            state
        }
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };

    let app = create_router(state);
    debug!("Router created successfully");

    info!("Starting server on {}", bind_address);
    let listener = match TcpListener::bind(bind_address).await {
        Ok(listener) => {
            debug!("Successfully bound to address: {}", bind_address);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", bind_address, e);
            return Err(e.into());
        }
    };

    info!("TRPG API server running on http://{}", bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server shutdown gracefully");
    Ok(())
}
