use anyhow::Result;
use bonnes_adresses::{AppState, Backend, build_router, config, database};
use std::{fs, io::ErrorKind, path::Path};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting bonnes-adresses with config: {:?}", cfg);

    // --- Ensure storage and picker directories exist ---
    for dir in [&cfg.storage_dir, &cfg.picker_dir] {
        if !Path::new(dir).exists() {
            fs::create_dir_all(dir)?;
            tracing::info!("Created directory at {}", dir);
        }
    }

    // --- Initialize SQLite connection + schema ---
    let db = database::connect(&cfg.database_url).await?;
    database::run_migrations(&db).await?;

    if migrate {
        tracing::info!("Database migration complete.");
        return Ok(()); // exit after migration
    }

    // --- Backend handle, built once and shared ---
    let backend = Backend::sqlite(db, cfg.storage_dir.clone(), cfg.public_url.clone())
        .with_picker_root(cfg.picker_dir.clone());
    let state = AppState::new(backend);
    state.spawn_session_watcher();

    // --- Build router ---
    let app = build_router(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    tracing::info!("Image download URLs use {}", cfg.public_url);
    axum::serve(listener, app).await?;

    Ok(())
}
