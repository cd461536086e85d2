use mfg_records::{app, ensure_database_exists, ensure_tables, load_model, AppState, PgStore, Settings};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mfg_records=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let model = load_model(settings.resources_path.as_deref()).await?;

    if settings.create_database {
        ensure_database_exists(&settings.database_url).await?;
    }
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;
    if settings.auto_migrate {
        ensure_tables(&pool, &model).await?;
    }

    let resources = model.resources.len();
    let state = AppState::new(Arc::new(PgStore::new(pool.clone())), model);
    let router = app(state, settings.body_limit);

    let listener = TcpListener::bind(("0.0.0.0", settings.port)).await?;
    tracing::info!(resources, "listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
