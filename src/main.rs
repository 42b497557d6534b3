use anyhow::{anyhow, Context};
use clap::Parser;
use tokenscope::{
    arguments::Arguments,
    config::load_config,
    context::AppContext,
    logger::{self, LogTag, LoggerConfig},
    services::{implementations::register_all, ServiceManager},
};

/// Main entry point
///
/// Precedence of settings: CLI flags > environment > TOML file > defaults.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();

    // Provisional logger so configuration loading is visible
    logger::init(LoggerConfig::from_settings(
        args.log_level.as_deref().unwrap_or("info"),
        args.debug.as_deref(),
    ));

    let mut config = load_config(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;
    args.apply_to(&mut config);

    let debug_tags = config.logging.debug_tags.join(",");
    let mut logger_config = LoggerConfig::from_settings(
        &config.logging.level,
        (!debug_tags.is_empty()).then_some(debug_tags.as_str()),
    );
    logger_config.use_colors = config.logging.use_colors;
    logger::set_logger_config(logger_config);

    logger::info(
        LogTag::System,
        &format!("tokenscope v{} starting up", env!("CARGO_PKG_VERSION")),
    );

    let context = AppContext::build(config.clone())
        .await
        .context("Failed to build application context")?;

    let mut manager = ServiceManager::new(config);
    register_all(&mut manager, &context);

    if let Err(e) = manager.start_all().await {
        logger::error(LogTag::System, &format!("Startup failed: {}", e));
        if let Err(stop_err) = manager.stop_all().await {
            logger::warning(LogTag::System, &format!("Cleanup after failed startup: {}", stop_err));
        }
        return Err(anyhow!("Service startup failed: {}", e));
    }

    wait_for_shutdown_signal().await;
    logger::info(LogTag::System, "Shutdown signal received, stopping services...");

    manager
        .stop_all()
        .await
        .map_err(|e| anyhow!("Service shutdown failed: {}", e))?;

    logger::info(LogTag::System, "tokenscope stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logger::error(LogTag::System, &format!("Failed to listen for Ctrl+C: {}", e));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                logger::error(LogTag::System, &format!("Failed to listen for SIGTERM: {}", e));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
