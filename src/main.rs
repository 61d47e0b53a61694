use std::sync::Arc;

use trackline::notify::QueueEvents;
use trackline::{config, db, state, storage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trackline=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;
    let config = Arc::new(config);

    storage::ensure_dirs(&config.upload_folder)?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(pool.as_ref()).await?;

    let state = Arc::new(state::AppState {
        pool,
        config: config.clone(),
        events: QueueEvents::new(128),
    });

    let app = trackline::build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("trackline listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
