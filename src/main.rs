use dotenvy::dotenv;
use tillpoint::{
    cache::LocalCache, config, connectivity::ConnectivityMonitor, diagnostics::DiagnosticsSink,
    errors::Result, session::SessionController,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application settings
    let settings = config::settings::load_default_settings()?;
    info!("Successfully processed application settings.");

    // 4. Connect to the backend and make sure local schemas exist
    let db = config::database::create_connection(&settings.database_url).await?;
    if settings.database_url.starts_with("sqlite:") {
        config::database::create_tables(&db).await?;
    }
    info!("Database connection established.");

    // 5. Wire the session: connectivity signal, cache, diagnostics
    let monitor = ConnectivityMonitor::new(settings.start_online);
    let cache = LocalCache::new(&settings.cache_dir);
    let diagnostics = DiagnosticsSink::new(settings.diagnostics_endpoint.clone());
    let controller = SessionController::new(db, monitor.subscribe(), cache, diagnostics);

    // 6. Drive the session loop until shutdown
    info!("Session runtime started; press Ctrl-C to stop.");
    controller.run().await;

    Ok(())
}
