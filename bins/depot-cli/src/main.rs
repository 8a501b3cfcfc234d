//! Command-line client for the DEPOT artifact cache.
//!
//! Drives the stateless client against a running server: `depot put` prints
//! the key of an uploaded file, `depot get` streams a blob back out.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use depot_core::{BlobKey, JobId};
use depot_service::client;

#[derive(Parser)]
#[command(name = "depot")]
#[command(about = "DEPOT artifact cache CLI", long_about = None)]
struct Cli {
    /// Address of the blob server.
    #[arg(long, global = true, default_value = "127.0.0.1:6124")]
    server: SocketAddr,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file and print its blob key
    Put {
        /// Path of the file to upload
        file: PathBuf,
        /// Job id to tag the upload with (32 hex characters)
        #[arg(long)]
        job: Option<JobId>,
    },
    /// Download a blob by key
    Get {
        /// Blob key (40 hex characters)
        key: BlobKey,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Put { file, job } => {
            let reader = tokio::fs::File::open(&file)
                .await
                .with_context(|| format!("failed to open {}", file.display()))?;

            let key = client::put_stream(job.as_ref(), reader, cli.server)
                .await
                .context("put failed")?;
            println!("{}", key);
        }
        Commands::Get { key, output } => {
            let mut blob = client::get(&key, cli.server)
                .await
                .context("get failed")?;

            match output {
                Some(path) => {
                    let mut file = tokio::fs::File::create(&path)
                        .await
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    tokio::io::copy(&mut blob, &mut file).await?;
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    tokio::io::copy(&mut blob, &mut stdout).await?;
                }
            }
        }
    }

    Ok(())
}
