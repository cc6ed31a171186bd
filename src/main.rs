use std::sync::Arc;

use sharenotes::admin::AdminCredentials;
use sharenotes::api::router;
use sharenotes::storage::LocalFileStore;
use sharenotes::{AppConfig, AppState, db};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "sharenotes=debug,tower_http=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = match db::connect(&config.database.url, config.database.max_connections).await {
        Ok(pool) => {
            info!("database connected: {}", config.database.url);
            pool
        }
        Err(e) => {
            error!("failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    let files = LocalFileStore::new(
        &config.storage.upload_dir,
        config.storage.max_upload_bytes,
    )
    .await?;

    let state = AppState {
        db: pool,
        files: Arc::new(files),
        admin: AdminCredentials::from(&config.admin),
    };

    let app = router(state, &config.server.static_dir);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
