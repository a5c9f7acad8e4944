use clap::Parser;
use deployhook::cli;
use deployhook::cli::commands::{Cli, Commands};
use deployhook::config::{paths, GlobalConfig};
use deployhook::daemon;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(paths::global_config_path);

    match cli.command {
        None | Some(Commands::Daemon) => {
            let config = GlobalConfig::resolve_from(&config_path)?;
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| config.listener.log_level.as_str().into()),
                )
                .init();
            daemon::run(config).await?;
        }
        Some(cmd) => {
            cli::handle_command(cmd, &config_path).await?;
        }
    }

    Ok(())
}
