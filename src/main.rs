use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::error;

use authflow_lib::bootstrap::{init_tracing_subscriber, load_config, AppConfig};
use authflow_lib::{parse_script, run_replay};

#[derive(Parser)]
#[command(name = "authflow")]
#[command(about = "Sign-in flow reconciliation engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed a JSON-lines script through the flow runtime and print the events
    Replay {
        /// TOML configuration file; built-in defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Script with one replay step per line
        #[arg(short, long)]
        script: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { config, script } => {
            let config = match config {
                Some(path) => load_config(path)?,
                None => AppConfig::empty(),
            };
            init_tracing_subscriber(&config.logging)?;

            let script = std::fs::read_to_string(&script)
                .with_context(|| format!("Failed to read replay script: {}", script.display()))?;
            let steps = parse_script(&script)?;

            let transcript = match run_replay(&config, steps).await {
                Ok(transcript) => transcript,
                Err(err) => {
                    error!(error = %err, "replay failed");
                    return Err(err);
                }
            };

            let mut stdout = std::io::stdout().lock();
            for line in transcript {
                writeln!(stdout, "{line}")?;
            }
        }
    }

    Ok(())
}
