use clap::Parser;
use latency_scalper::cli::{print_bands, print_config, Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = cli.load_config()?;
    config.apply_env();

    // Initialize telemetry
    latency_scalper::telemetry::init_telemetry(&config.telemetry)?;
    config.validate()?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting paper trading mode");
            args.execute(config).await?;
        }
        Commands::Probe(args) => {
            args.execute(config).await?;
        }
        Commands::Bands => print_bands(&config)?,
        Commands::Config => print_config(&config)?,
    }

    Ok(())
}
