//! clozex: runs cloze prediction/production sessions from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod app;
mod console;
mod devices;
mod shuffle;
mod simulated;

pub use app::{App, RunOptions};

#[derive(Parser)]
#[command(name = "clozex", version, about = "Cloze prediction and production experiment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one participant session
    Run {
        /// TOML config with [experiment] timings and [script] steps
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding the stimulus tables named by the script
        #[arg(long, default_value = "stimuli")]
        stimuli_dir: PathBuf,

        /// Directory for the result log and session summary
        #[arg(long, default_value = "results")]
        output: PathBuf,

        /// Participant id, generated when omitted
        #[arg(long)]
        participant: Option<String>,

        /// Answer with a random simulated participant instead of the terminal
        #[arg(long)]
        simulate: bool,

        /// Seed for participant id generation and simulation
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Pseudorandomize a stimulus table
    Shuffle {
        /// Stimulus table CSV
        #[arg(long)]
        input: PathBuf,

        /// Output CSV, stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,

        /// Number of independent orders
        #[arg(long, default_value = "1")]
        orders: usize,

        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clozex=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            stimuli_dir,
            output,
            participant,
            simulate,
            seed,
        } => {
            let options = RunOptions {
                config,
                stimuli_dir,
                output,
                participant,
                simulate,
                seed,
            };
            async { App::new(options)?.run().await.map(|_| ()) }.await
        }
        Commands::Shuffle {
            input,
            output,
            orders,
            seed,
        } => shuffle::execute(input, output, orders, seed),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
