//! CLI entry and dispatch.

use std::fmt;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use typist_core::config;

mod commands;

#[derive(Parser)]
#[command(name = "typist")]
#[command(version)]
#[command(about = "Chat with a serial typewriter at human pace")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Serial device (overrides [serial].port)
    #[arg(long, global = true, env = "TYPIST_PORT")]
    port: Option<String>,

    /// Baud rate (overrides [serial].baud_rate)
    #[arg(long, global = true)]
    baud: Option<u32>,

    /// Override the chat model from config
    #[arg(long, global = true)]
    model: Option<String>,

    /// Override the system prompt from config
    #[arg(long, global = true)]
    system_prompt: Option<String>,

    /// Log at debug level (RUST_LOG wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the conversation loop on the serial device (default)
    Chat,
    /// Type a message once, then exit
    Type {
        /// Text to type
        #[arg(value_name = "TEXT")]
        text: String,

        /// Type without pauses or typos
        #[arg(long)]
        clean: bool,
    },
    /// List serial ports visible to the system
    Ports,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Generate a fresh config from Rust defaults (for xtask)
    Generate,
}

/// Returned when the user stops a command with Ctrl+C.
#[derive(Debug)]
pub struct Interrupted;

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "interrupted")
    }
}

impl std::error::Error for Interrupted {}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "typist=debug,typist_core=debug" } else { "info" })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        command,
        port,
        baud,
        model,
        system_prompt,
        verbose: _,
    } = cli;

    // config commands must work even when the file is broken
    if let Some(Commands::Config { command }) = &command {
        return match command {
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
        };
    }

    let mut config = config::Config::load().context("load config")?;

    if let Some(port) = port {
        config.serial.port = Some(port);
    }
    if let Some(baud) = baud {
        config.serial.baud_rate = baud;
    }
    if let Some(model) = model {
        config.provider.model = model;
    }
    if let Some(sp) = system_prompt.as_deref() {
        let trimmed = sp.trim();
        config.system_prompt = (!trimmed.is_empty()).then(|| trimmed.to_string());
        config.system_prompt_file = None;
    }

    config.validate().context("invalid config")?;

    match command.unwrap_or(Commands::Chat) {
        Commands::Chat => commands::chat::run(&config).await,
        Commands::Type { text, clean } => commands::type_text::run(&config, &text, clean).await,
        Commands::Ports => commands::ports::run(),
        // handled before the config is loaded
        Commands::Config { .. } => Ok(()),
    }
}
