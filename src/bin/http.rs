#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::path::PathBuf;
    use std::sync::Arc;

    use comic_workflow::{AppConfig, MemoryStore, Storage, WorkflowService, http_api, logging};

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;
    logging::init(&config.log_filter);

    let store: Arc<dyn Storage> = match &config.database_path {
        #[cfg(feature = "sqlite")]
        Some(path) => Arc::new(comic_workflow::SqliteStore::new(path)?),
        #[cfg(not(feature = "sqlite"))]
        Some(path) => {
            tracing::warn!(path = %path.display(), "built without `sqlite`; using in-memory store");
            Arc::new(MemoryStore::new())
        }
        None => Arc::new(MemoryStore::new()),
    };

    let addr = config.socket_addr()?;
    let service = WorkflowService::from_config(store, &config)?;
    http_api::serve(addr, service).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
