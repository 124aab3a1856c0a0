mod check;
mod env;
mod keygen;
mod send;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stenogramma-cli")]
#[command(about = "Client for the Stenogramma encrypted transcription service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a .wav file, upload it, and save the decrypted transcript
    Send {
        /// Path to the audio file (.wav)
        audio_file: PathBuf,

        /// Where to write the transcript (default: transcript.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate endpoint and key material, print it and write .env
    Keygen {
        /// Overwrite an existing .env
        #[arg(long)]
        force: bool,
    },
    /// Verify the local configuration and probe the server
    Check {
        /// Server to probe (default: SERVER_URL, else http://localhost:8000)
        #[arg(long)]
        server_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Send { audio_file, output } => send::run(audio_file, output).await,
        Commands::Keygen { force } => keygen::run(force).await,
        Commands::Check { server_url } => check::run(server_url).await,
    }
}
