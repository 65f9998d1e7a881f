use anyhow::Context;
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gedung_booking::{
    app,
    config::{Config, LogFormat},
    database::Database,
    services::credentials::StaticCredentials,
    store::{MemoryStore, PgStore, Repository},
    AppState,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("invalid configuration")?;

    let registry = tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&config.app.rust_log));
    match config.app.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    info!("Starting Gedung Serbaguna booking API ({})", config.app.environment);

    // Pick the store
    let store: Arc<dyn Repository> = match &config.database.url {
        Some(url) => {
            let db = Database::connect(url, &config.database)
                .await
                .context("failed to connect to database")?;
            info!("Database connected");
            db.run_migrations().await.context("failed to run migrations")?;
            Arc::new(PgStore::new(&db))
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let credentials = StaticCredentials::from_config(&config.accounts).context("failed to hash staff passwords")?;
    let app_state = AppState::new(store, config.clone(), Arc::new(credentials));

    // Finish archive moves a previous run left half done
    match app_state.lifecycle().recover(Utc::now()).await {
        Ok(report) if report.archived > 0 => info!("Recovered {} bookings into history", report.archived),
        Ok(_) => {}
        Err(e) => error!("Archive recovery failed: {:?}", e),
    }

    // --- Start background tasks ---

    // Move finished bookings into history on a fixed interval
    let sweep_state = app_state.clone();
    let interval = Duration::from_secs(config.sweep.interval_secs.max(1));
    task::spawn(async move {
        loop {
            if let Err(e) = sweep_state.lifecycle().sweep(Utc::now()).await {
                error!("Background sweep failed: {:?}", e);
            }
            tokio::time::sleep(interval).await;
        }
    });

    // --- Start the web server ---

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port)
        .parse()
        .context("invalid HOST/PORT")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(app_state).into_make_service()).await?;
    Ok(())
}
