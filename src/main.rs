use anyhow::Result;
use clap::Parser;
use std::time::Duration;

use approval_workflows::cli::commands::{ConfigCommand, DemoCommand, SessionCommand};
use approval_workflows::cli::{Cli, Commands};
use approval_workflows::{init_telemetry, ApprovalConfig};

const STDIN_RELEASE_TIMEOUT: Duration = Duration::from_millis(500);

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = ApprovalConfig::load_env_file() {
        eprintln!("Warning: failed to load .env file: {e}");
    }
    let config = ApprovalConfig::load()?;
    init_telemetry(&config.observability)?;

    match cli.command {
        Commands::Session {
            default_timeout,
            sweep_interval,
        } => {
            let command = SessionCommand::from_config(&config)
                .with_default_timeout(default_timeout)
                .with_sweep_interval(sweep_interval);
            let runtime = tokio::runtime::Runtime::new()?;
            let result = runtime.block_on(command.execute());
            // stdin reads run on the blocking pool and never observe shutdown
            runtime.shutdown_timeout(STDIN_RELEASE_TIMEOUT);
            result
        }
        Commands::Demo => DemoCommand::new().execute(),
        Commands::Config => ConfigCommand::new(config).execute(),
    }
}
