mod config;
mod error;
mod routes;

use config::AppConfig;
use prep_core::db::Database;
use routes::{app_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("prep_api=info".parse()?),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting prep-api with config: {:?}", config);

    std::fs::create_dir_all(&config.data_dir)?;
    let db = Database::open(config.database_path()).await?;
    let router = app_router(AppState::new(db));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("prep-api listening on {}", config.bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
