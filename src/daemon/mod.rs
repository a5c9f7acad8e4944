pub mod deploy;
pub mod dispatch;
pub mod protocol;
pub mod scheduler;
pub mod server;
pub mod signature;
pub mod webhook;

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::GlobalConfig;
use crate::daemon::deploy::DeployRunner;
use crate::daemon::scheduler::{Job, Scheduler};
use crate::daemon::signature::SignatureVerifier;

/// Shared state for webhook handlers. Read-only after startup.
pub struct DaemonState {
    pub config: GlobalConfig,
    pub verifier: SignatureVerifier,
    pub scheduler_tx: mpsc::Sender<Job>,
}

impl DaemonState {
    pub fn new(config: GlobalConfig, scheduler_tx: mpsc::Sender<Job>) -> Self {
        let verifier = SignatureVerifier::new(config.webhook.secret.clone());
        Self {
            config,
            verifier,
            scheduler_tx,
        }
    }
}

/// Main entry point for the listener
pub async fn run(config: GlobalConfig) -> anyhow::Result<()> {
    tracing::info!("Starting deployhook listener...");

    let runner = DeployRunner::from_config(&config.deploy);
    let scheduler = Scheduler::new(runner, config.deploy.overlap);
    tracing::info!(
        "Deploy script: {} (overlap: {}, timeout: {})",
        scheduler.runner().script().display(),
        config.deploy.overlap,
        config
            .deploy
            .timeout_secs
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "none".to_string())
    );
    if !scheduler.runner().script().exists() {
        tracing::warn!(
            "Deploy script {} does not exist yet; pushes will fail until it does",
            scheduler.runner().script().display()
        );
    }

    let (scheduler_tx, scheduler_rx) = mpsc::channel(100);
    tokio::spawn(scheduler.run(scheduler_rx));

    let state = Arc::new(DaemonState::new(config, scheduler_tx));

    server::run(state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Could not listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received, stopping...");
    })
    .await?;

    tracing::info!("deployhook stopped");
    Ok(())
}
