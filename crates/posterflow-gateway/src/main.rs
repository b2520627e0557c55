use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use tracing::info;

use posterflow_core::config::PosterflowConfig;
use posterflow_scheduler::{DispatchEngine, MediaLocator, TickWindow};
use posterflow_store::{CustomerStore, PosterStore, ScheduleStore};
use posterflow_whatsapp::CloudApiSender;

mod app;
mod http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "posterflow_gateway=info,posterflow_scheduler=info,tower_http=debug".into()
            }),
        )
        .init();

    // load config: explicit POSTERFLOW_CONFIG path > ~/.posterflow/posterflow.toml
    let config_path = std::env::var("POSTERFLOW_CONFIG").ok();
    let config = PosterflowConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        PosterflowConfig::default()
    });

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let db_path = config.database.path.clone();
    ensure_parent_dir(&db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(&db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    posterflow_store::db::init_db(&db)?;
    info!("database migrations complete");

    // gateway-side stores share one connection
    let gateway_conn = Arc::new(Mutex::new(rusqlite::Connection::open(&db_path)?));
    let schedules = ScheduleStore::new(Arc::clone(&gateway_conn))?;
    let customers = CustomerStore::new(Arc::clone(&gateway_conn))?;
    let posters = PosterStore::new(Arc::clone(&gateway_conn))?;

    // engine-side stores get their own connection so a tick's work never
    // contends with request handling
    let engine_conn = Arc::new(Mutex::new(rusqlite::Connection::open(&db_path)?));
    let engine_schedules = ScheduleStore::new(Arc::clone(&engine_conn))?;
    let engine_customers = CustomerStore::new(Arc::clone(&engine_conn))?;

    let window = TickWindow::from_config(&config.delivery)?;
    let media = MediaLocator::new(&config.delivery.media_base_url);
    let sender =
        Arc::new(CloudApiSender::new(&config.whatsapp).context("building WhatsApp sender")?);

    let engine = DispatchEngine::new(
        engine_schedules,
        engine_customers,
        sender,
        window,
        media,
        &config.delivery,
    );

    // spawn dispatch engine loop in background
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move { engine.run(shutdown_rx).await });

    let state = Arc::new(app::AppState {
        config,
        schedules,
        customers,
        posters,
        window,
    });
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("Posterflow gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    // signal dispatch engine to stop
    let _ = shutdown_tx.send(true);
    Ok(())
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
