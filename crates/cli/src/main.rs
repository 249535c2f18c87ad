mod config_commands;
mod memory_commands;
mod text_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    threadline_config::ThreadlineConfig,
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "threadline", about = "Threadline: conversation threads and chained posts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of searching the standard locations.
    #[arg(long, global = true, env = "THREADLINE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split text into post-sized chunks.
    Segment {
        /// Maximum weighted length per chunk (defaults to the configured post limit).
        #[arg(long)]
        max_length: Option<usize>,
        /// Input file; stdin when omitted.
        file: Option<PathBuf>,
    },
    /// Parse action markers out of model output.
    Intents {
        /// Input file; stdin when omitted.
        file: Option<PathBuf>,
    },
    /// Check text against the spam heuristic.
    CheckSpam {
        /// Input file; stdin when omitted.
        file: Option<PathBuf>,
    },
    /// Configuration inspection.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
    /// Inspect persisted memories.
    Memory {
        #[command(subcommand)]
        action: memory_commands::MemoryAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<ThreadlineConfig> {
    match path {
        Some(path) => Ok(threadline_config::load_config(path)?),
        None => Ok(threadline_config::discover_and_load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "threadline starting");

    match cli.command {
        Commands::Segment { max_length, file } => {
            let max_length = match max_length {
                Some(n) => n,
                None => load_config(cli.config.as_deref())?.platform.post_limit,
            };
            text_commands::segment(file.as_deref(), max_length)
        },
        Commands::Intents { file } => text_commands::intents(file.as_deref()),
        Commands::CheckSpam { file } => text_commands::check_spam(file.as_deref()),
        Commands::Config { action } => {
            config_commands::handle_config(action, cli.config.as_deref())
        },
        Commands::Memory { action } => {
            let config = load_config(cli.config.as_deref())?;
            memory_commands::handle_memory(action, &config).await
        },
    }
}
