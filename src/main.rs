use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use takeout_migrate::config::MigrationConfig;
use takeout_migrate::engine::{AuditLog, MigrationEngine};
use takeout_migrate::immich::{ImmichApi, ImmichClient};
use takeout_migrate::takeout;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Migrate a Google Photos Takeout export into an Immich server"
)]
struct Cli {
    /// Immich server URL
    #[arg(long, default_value = "http://localhost:2283")]
    server_url: String,

    /// Immich API key (required unless --dry-run)
    #[arg(long)]
    api_key: Option<String>,

    /// Path to the Takeout folder
    #[arg(long)]
    takeout_path: PathBuf,

    /// Number of parallel upload workers
    #[arg(long, default_value_t = 10)]
    max_workers: usize,

    /// Files per batch; batches run sequentially
    #[arg(long, default_value_t = 100)]
    batch_size: usize,

    /// Upload timeout in seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Retry attempts for transient server errors
    #[arg(long, default_value_t = 3)]
    retry_attempts: u32,

    /// Scan and classify without uploading anything
    #[arg(long)]
    dry_run: bool,

    /// Directory the album audit logs are written to
    #[arg(long, default_value = ".")]
    audit_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    // Use RUST_LOG if set, otherwise default to info level
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    let cli = Cli::parse();

    let config = MigrationConfig {
        server_url: cli.server_url,
        api_key: cli.api_key.unwrap_or_default(),
        takeout_path: cli.takeout_path,
        max_workers: cli.max_workers,
        batch_size: cli.batch_size,
        retry_attempts: cli.retry_attempts,
        upload_timeout: Duration::from_secs(cli.timeout),
        dry_run: cli.dry_run,
    };

    if let Err(err) = config.validate() {
        error!("{}", err);
        std::process::exit(1);
    }

    let api: Arc<dyn ImmichApi> = match ImmichClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            error!("Failed to create API client: {}", err);
            std::process::exit(1);
        }
    };

    let audit = if config.dry_run {
        Arc::new(AuditLog::disabled())
    } else {
        match AuditLog::open(&cli.audit_dir) {
            Ok(audit) => Arc::new(audit),
            Err(err) => {
                error!(
                    "Failed to open audit logs in {}: {}",
                    cli.audit_dir.display(),
                    err
                );
                std::process::exit(1);
            }
        }
    };

    // First Ctrl-C stops submitting batches; in-flight uploads drain.
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, finishing the current batch before stopping");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    info!("Starting processing of: {}", config.takeout_path.display());

    let units = match takeout::scan_takeout(&config.takeout_path) {
        Ok(units) => units,
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };
    info!("Found: {} media files", units.len());

    let engine = MigrationEngine::new(api, &config, audit, shutdown);
    let report = engine.run(units).await;
    report.log_summary();
}
