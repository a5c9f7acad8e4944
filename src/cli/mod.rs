pub mod commands;
pub mod display;
pub mod send;
pub mod settings;
pub mod sign;

use std::path::Path;

use crate::cli::commands::Commands;

/// Handle a specific CLI subcommand
pub async fn handle_command(cmd: Commands, config_path: &Path) -> anyhow::Result<()> {
    match cmd {
        Commands::Daemon => unreachable!(),
        Commands::Sign { file } => {
            sign::sign_payload(config_path, file.as_deref()).await?;
        }
        Commands::Send { url, event, file } => {
            send::send_test_delivery(config_path, url, &event, file.as_deref()).await?;
        }
        Commands::Config { action } => {
            settings::handle_config_action(action, config_path)?;
        }
    }
    Ok(())
}

/// Payload bytes from `file`, or stdin
pub(crate) async fn read_payload(file: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    use tokio::io::AsyncReadExt;

    match file {
        Some(path) => Ok(tokio::fs::read(path).await?),
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            Ok(buf)
        }
    }
}
