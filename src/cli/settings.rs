use console::style;
use std::path::Path;

use crate::cli::commands::ConfigAction;
use crate::cli::display;
use crate::config::{GlobalConfig, WebhookSecret};
use crate::error::DeployhookError;

pub fn handle_config_action(action: ConfigAction, config_path: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => show_config(config_path),
        ConfigAction::Init { force } => init_config(config_path, force),
    }
}

fn show_config(config_path: &Path) -> anyhow::Result<()> {
    let mut config = GlobalConfig::load_from(config_path)?;
    config.apply_overrides(|key| std::env::var(key).ok())?;

    display::print_banner();
    display::print_field(
        "Config file:",
        if config_path.exists() {
            config_path.display().to_string()
        } else {
            format!("{} {}", config_path.display(), style("(not found)").dim())
        },
    );
    display::print_field("Listen:", config.bind_addr());
    display::print_field("Path:", &config.listener.path);
    display::print_field("Body limit:", format!("{} bytes", config.listener.max_body_bytes));
    display::print_field("Log level:", &config.listener.log_level);
    display::print_field("Secret:", &config.webhook.secret);
    display::print_field("Script:", config.deploy.script.display());
    if !config.deploy.args.is_empty() {
        display::print_field("Args:", config.deploy.args.join(" "));
    }
    if let Some(dir) = &config.deploy.working_dir {
        display::print_field("Working dir:", dir.display());
    }
    display::print_field(
        "Timeout:",
        config
            .deploy
            .timeout_secs
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "none".to_string()),
    );
    display::print_field("Overlap:", config.deploy.overlap);
    println!();

    match config.validate() {
        Ok(()) => display::print_success("Configuration is valid"),
        Err(e) => display::print_error(&e.to_string()),
    }
    Ok(())
}

fn init_config(config_path: &Path, force: bool) -> anyhow::Result<()> {
    if config_path.exists() && !force {
        return Err(DeployhookError::Config(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        ))
        .into());
    }

    let mut config = GlobalConfig::default();
    config.webhook.secret = WebhookSecret::new(crate::utils::generate_webhook_secret());
    config.save_to(config_path)?;

    display::print_success(&format!("Wrote {}", config_path.display()));
    println!(
        "  {}",
        style("Copy [webhook].secret from the file into the webhook settings of your repository.")
            .dim()
    );
    Ok(())
}
