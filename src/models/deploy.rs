use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

use crate::models::events::PushSummary;
use crate::utils;

/// Request-side context of a deploy. Only used for logging; nothing in it
/// reaches the command line of the deploy script.
#[derive(Debug, Clone, Default)]
pub struct DeployTrigger {
    pub delivery_id: Option<String>,
    pub repository: Option<String>,
    pub git_ref: Option<String>,
    pub commit: Option<String>,
    pub pusher: Option<String>,
}

impl DeployTrigger {
    pub fn from_push(delivery_id: Option<String>, push: PushSummary) -> Self {
        Self {
            delivery_id,
            repository: push.repository_name().map(str::to_string),
            pusher: push.pusher_name().map(str::to_string),
            git_ref: push.git_ref,
            commit: push.after,
        }
    }
}

/// Log correlation line, e.g. `delivery: 72d3, ref: refs/heads/main, commit: 9f2c1e0`
impl std::fmt::Display for DeployTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "delivery: {}", self.delivery_id.as_deref().unwrap_or("-"))?;
        if let Some(repository) = &self.repository {
            write!(f, ", repo: {}", repository)?;
        }
        if let Some(git_ref) = &self.git_ref {
            write!(f, ", ref: {}", git_ref)?;
        }
        if let Some(commit) = &self.commit {
            write!(f, ", commit: {}", utils::short_sha(commit))?;
        }
        if let Some(pusher) = &self.pusher {
            write!(f, ", pusher: {}", pusher)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeployStatus {
    Succeeded,
    Failed { code: Option<i32> },
    SpawnFailed(String),
    TimedOut,
    /// Dropped because another run was in flight
    Skipped,
}

impl DeployStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, DeployStatus::Succeeded)
    }
}

impl std::fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeployStatus::Succeeded => write!(f, "succeeded"),
            DeployStatus::Failed { code: Some(code) } => write!(f, "failed (exit code {})", code),
            DeployStatus::Failed { code: None } => write!(f, "failed (killed by signal)"),
            DeployStatus::SpawnFailed(e) => write!(f, "could not start: {}", e),
            DeployStatus::TimedOut => write!(f, "timed out"),
            DeployStatus::Skipped => write!(f, "skipped (deploy already running)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub run_id: Uuid,
    pub trigger: DeployTrigger,
    pub status: DeployStatus,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub stdout: String,
    pub stderr: String,
    /// Either stream went over the capture limit
    pub output_truncated: bool,
}

impl DeployOutcome {
    pub fn new(run_id: Uuid, trigger: DeployTrigger, status: DeployStatus) -> Self {
        Self {
            run_id,
            trigger,
            status,
            started_at: Utc::now(),
            elapsed: Duration::ZERO,
            stdout: String::new(),
            stderr: String::new(),
            output_truncated: false,
        }
    }
}
