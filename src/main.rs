use clap::Parser;
use price_hub::cli::{Cli, Commands};
use price_hub::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let (config, load_error) = match Config::load(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    // Initialize telemetry
    price_hub::telemetry::init_telemetry(&config.telemetry)?;

    if let Some(e) = load_error {
        tracing::warn!(path = %cli.config, error = %e, "Could not load config, using defaults");
    }

    match cli.command {
        Commands::Serve(args) => {
            args.execute(config).await?;
        }
        Commands::Quote(args) => {
            args.execute(&config).await?;
        }
        Commands::Watch(args) => {
            args.execute().await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Server: {} (outbox {})", config.server.bind, config.server.outbox_capacity);
            let instruments: Vec<&str> = config
                .catalog
                .instruments
                .iter()
                .map(|i| i.as_str())
                .collect();
            println!(
                "  Catalog: {} (strict={})",
                instruments.join(", "),
                config.catalog.strict
            );
            println!(
                "  Source: {} timeout={}s key={}",
                config.source.base_url,
                config.source.timeout_secs,
                if config.api_key().is_some() { "set" } else { "demo" }
            );
            println!(
                "  Poller: every {}s, {} concurrent fetches",
                config.poller.interval_secs, config.poller.max_concurrent_fetches
            );
            println!(
                "  Telemetry: level={} format={:?} metrics_port={:?}",
                config.telemetry.log_level,
                config.telemetry.log_format,
                config.telemetry.metrics_port
            );
        }
    }

    Ok(())
}
