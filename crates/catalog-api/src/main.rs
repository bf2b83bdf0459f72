//! Product catalog admin server.

use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use catalog_api::{app, AppState, ServerConfig};
use catalog_db::{log_pool_metrics, Database, FilesystemBackend, ImageStorage};

/// Install the global subscriber.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file, rotated daily (default: stdout)
///   LOG_ANSI    - "true"/"false" to force ANSI colors
///   RUST_LOG    - env filter (default: "catalog_api=debug,tower_http=debug")
///
/// The returned guard must live as long as the process when logging to a file.
fn init_logging() -> Option<WorkerGuard> {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json");
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "catalog_api=debug,catalog_db=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let Some(path) = log_file else {
        if json {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        return None;
    };

    let path = std::path::Path::new(&path);
    let dir = path.parent().unwrap_or(std::path::Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("catalog-api.log");
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name));

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(log_ansi.unwrap_or(false)),
            )
            .init();
    }
    Some(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_logging();

    let config = ServerConfig::from_env();
    info!(
        subsystem = "api",
        component = "config",
        config = ?config,
        "Configuration loaded"
    );

    let storage = ImageStorage::new(
        FilesystemBackend::new(&config.file_storage_path),
        &config.public_image_base_url,
    );
    if let Err(e) = storage.check().await {
        error!(
            subsystem = "storage",
            path = %config.file_storage_path,
            error = %e,
            "File storage is not usable"
        );
        anyhow::bail!("file storage check failed: {}", e);
    }

    let db = Database::connect(&config.database_url, config.pool_config()?, storage).await?;
    db.migrate().await?;
    log_pool_metrics(db.pool());
    info!(subsystem = "db", "Migrations applied");

    let addr = config.socket_addr()?;
    let router = app(AppState::new(db, config));

    info!(subsystem = "api", %addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
