use clap::Parser;
use rota_app::cli::Cli;
use rota_app::commands::{execute, load_supplier};
use rota_core::config::load_config;
use rota_engine::Resolver;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config()?;

    tracing::debug!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping info");
    }

    let path = cli.schedules.as_deref().unwrap_or(&config.schedules.path);
    let supplier = load_supplier(path)?;
    let resolver = Resolver::new(config.resolver.priority_policy);

    let output = execute(&cli.command, &supplier, resolver, chrono::Utc::now())?;
    print!("{output}");

    Ok(())
}
