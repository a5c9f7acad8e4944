use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "deployhook",
    about = "Webhook deployment listener - run a deploy script on signed push events",
    version
)]
pub struct Cli {
    /// Config file (defaults to $DEPLOYHOOK_CONFIG or /etc/deployhook/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Start the webhook listener (default)
    Daemon,

    /// Print the X-Hub-Signature-256 value for a payload
    Sign {
        /// Payload file (reads stdin when omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Send a signed test delivery to a running listener
    Send {
        /// Listener URL (defaults to the configured local address)
        #[arg(long)]
        url: Option<String>,

        /// Event type header value
        #[arg(long, default_value = "push")]
        event: String,

        /// Payload file (a minimal push payload when omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Show the effective configuration (secret redacted)
    Show,

    /// Write a default config file with a fresh secret
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
