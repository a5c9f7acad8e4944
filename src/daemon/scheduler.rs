use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::config::OverlapPolicy;
use crate::daemon::deploy::{self, DeployRunner};
use crate::models::deploy::{DeployOutcome, DeployStatus, DeployTrigger};

#[derive(Debug)]
pub enum Job {
    Deploy { trigger: DeployTrigger },
}

/// Owns the deploy runner and applies the overlap policy
#[derive(Clone)]
pub struct Scheduler {
    runner: Arc<DeployRunner>,
    policy: OverlapPolicy,
    gate: Arc<Mutex<()>>,
    reports: Option<mpsc::UnboundedSender<DeployOutcome>>,
}

impl Scheduler {
    pub fn new(runner: DeployRunner, policy: OverlapPolicy) -> Self {
        Self {
            runner: Arc::new(runner),
            policy,
            gate: Arc::new(Mutex::new(())),
            reports: None,
        }
    }

    /// Also send every finished outcome to `tx`
    pub fn with_reports(mut self, tx: mpsc::UnboundedSender<DeployOutcome>) -> Self {
        self.reports = Some(tx);
        self
    }

    pub fn runner(&self) -> &DeployRunner {
        &self.runner
    }

    /// Run the scheduler loop until every sender is dropped
    pub async fn run(self, mut rx: mpsc::Receiver<Job>) {
        let queue = match self.policy {
            OverlapPolicy::Queue => Some(self.spawn_queue_worker()),
            _ => None,
        };

        while let Some(job) = rx.recv().await {
            if let Some(queue) = &queue {
                if queue.send(job).is_err() {
                    tracing::error!("Deploy queue worker stopped, job dropped");
                }
                continue;
            }

            // Each job gets its own task; a panic in one stays there
            let scheduler = self.clone();
            tokio::spawn(async move { scheduler.handle(job).await });
        }
        tracing::debug!("Deploy scheduler stopped");
    }

    /// Single worker for queued jobs, so they start in arrival order
    fn spawn_queue_worker(&self) -> mpsc::UnboundedSender<Job> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let scheduler = self.clone();

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let scheduler = scheduler.clone();
                if let Err(e) = tokio::spawn(async move { scheduler.handle(job).await }).await {
                    tracing::error!("Queued deploy task failed: {}", e);
                }
            }
        });
        tx
    }

    async fn handle(&self, job: Job) {
        match job {
            Job::Deploy { trigger } => {
                let outcome = self.execute(trigger).await;
                if let Some(tx) = &self.reports {
                    let _ = tx.send(outcome);
                }
            }
        }
    }

    pub async fn execute(&self, trigger: DeployTrigger) -> DeployOutcome {
        match self.policy {
            OverlapPolicy::Allow => self.runner.run(trigger).await,
            OverlapPolicy::Queue => {
                let _guard = self.gate.lock().await;
                self.runner.run(trigger).await
            }
            OverlapPolicy::Reject => {
                let Ok(_guard) = self.gate.try_lock() else {
                    let outcome = DeployOutcome::new(Uuid::new_v4(), trigger, DeployStatus::Skipped);
                    deploy::log_outcome(&outcome);
                    return outcome;
                };
                self.runner.run(trigger).await
            }
        }
    }
}
