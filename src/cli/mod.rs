use clap::{Parser, Subcommand};

pub mod commands;

#[derive(Parser)]
#[command(name = "approval-workflows")]
#[command(about = "Human-in-the-loop approval workflows with timeout tracking")]
#[command(long_about = "Tracks approval requests from creation until a reviewer approves or rejects \
                       them, or until their timeout elapses. State lives in memory for the lifetime \
                       of the process.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process JSON requests from stdin, one per line, writing one JSON response per line
    Session {
        /// Override the configured default timeout for create requests
        #[arg(long, help = "Default timeout in minutes for create requests that omit one")]
        default_timeout: Option<u32>,
        /// Override the configured sweep interval
        #[arg(long, help = "Seconds between background expiry sweeps (0 disables)")]
        sweep_interval: Option<u64>,
    },
    /// Run the reference approval scenarios against a simulated clock
    Demo,
    /// Print the effective configuration as TOML
    Config,
}
