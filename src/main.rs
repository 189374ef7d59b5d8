use anyhow::Result;
use tracing::{error, info, warn};

use dstcheck::cli::{parse_args, print_help};
use dstcheck::config::Config;
use dstcheck::error::DstError;
use dstcheck::run::run_once;

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();

    if args.help {
        print_help();
        return Ok(());
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dstcheck=info".parse()?),
        )
        .init();

    info!("dstcheck v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(store) = args.store {
        config = config.with_store_path(store);
    }
    info!("Configuration loaded");
    info!("  Handler: {}", config.transition_batch.display());
    info!("  Store: {}", config.store_path.display());
    info!("  Backup: {}", config.backup_path().display());
    info!("  Tolerance: {}s", config.tolerance_secs);
    info!("  Pacing delay: {}ms", config.pacing_delay_ms);

    // Handle --validate mode
    if args.validate {
        info!("Validating configuration...");
        match config.validate() {
            Ok(()) => {
                info!("Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
    }

    match run_once(&config).await {
        Ok(report) => {
            info!(
                "Run complete: {} records, {} refreshed, {} handler runs, {} per-record failures",
                report.total(),
                report.refreshed,
                report.handler_succeeded + report.handler_failed,
                report.failures()
            );
            Ok(())
        }
        Err(e @ DstError::NotSaved { .. }) => {
            error!("Run failed after processing: {}", e);
            std::process::exit(1);
        }
        Err(e) if e.is_fatal() => {
            error!("Run failed: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            warn!("Run finished with error: {}", e);
            Ok(())
        }
    }
}
