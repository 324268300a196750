//! Command line root and logging setup.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::Command;

/// Plan token assignment and bootstrap streaming for a joining node.
#[derive(Debug, Parser)]
#[command(name = "ringctl", version)]
pub struct CliConfig {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub async fn run(self) -> anyhow::Result<()> {
        init_tracing(self.verbose);
        let result = self.command.execute().await?;
        println!("{}", result);
        Ok(())
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Logs go to stderr so stdout stays machine readable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
