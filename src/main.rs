use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(version, about = "Garment development workflow client")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to atelier.toml. Defaults to ./atelier.toml, then the user
    /// config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch live comment drafts for a proto
    Watch {
        /// Proto whose draft channel to join
        #[arg(long)]
        proto_id: i64,
    },
    /// Upload a media file and print its URL
    Upload {
        /// Path to the file
        file: PathBuf,

        /// Media kind: photo or video
        #[arg(long, default_value = "photo")]
        kind: String,
    },
    /// List development cycles
    Cycles,
    /// List persisted comments for a proto
    Comments {
        #[arg(long)]
        proto_id: i64,
    },
    /// Run the local draft relay
    Relay {
        /// Port to serve on
        #[arg(short, long, default_value = "4710")]
        port: u16,

        /// Require this exact token on every connection
        #[arg(long)]
        token: Option<String>,

        /// Enable dev mode (bind all interfaces, permissive CORS)
        #[arg(long)]
        dev: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = atelier::config::Config::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Watch { proto_id } => cmd::cmd_watch(&config, *proto_id).await?,
        Commands::Upload { file, kind } => cmd::cmd_upload(&config, file.clone(), kind).await?,
        Commands::Cycles => cmd::cmd_cycles(&config).await?,
        Commands::Comments { proto_id } => cmd::cmd_comments(&config, *proto_id).await?,
        Commands::Relay { port, token, dev } => cmd::cmd_relay(*port, token.clone(), *dev).await?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "atelier=debug" } else { "atelier=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
