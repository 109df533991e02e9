use clap::{Args, Parser, Subcommand};
use countwatch::{
    cmd::{OnceArgs, once},
    config::AppConfig,
    supervisor::Supervisor,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the poller and the HTTP API until interrupted.
    Run(RunArgs),
    /// Polls the configured source once and prints the result as JSON.
    Once(OnceArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Directory containing `app.yaml`.
    #[arg(short, long)]
    config_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_supervisor(args).await?,
        Commands::Once(args) => once::execute(args).await?,
    }

    Ok(())
}

async fn run_supervisor(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!("Loading application configuration...");
    let config = AppConfig::new(args.config_dir.as_deref())?;
    tracing::debug!(
        source = ?config.source,
        polling_interval_ms = config.polling_interval_ms.as_millis() as u64,
        max_buckets = config.max_buckets,
        "Configuration loaded."
    );

    let supervisor = Supervisor::builder().config(config).build()?;
    tracing::info!("Supervisor initialized, starting poller...");

    supervisor.run().await?;

    Ok(())
}
