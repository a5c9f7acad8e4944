use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::DeployhookError;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GlobalConfig {
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ListenerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_path(),
            max_body_bytes: default_max_body_bytes(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9876
}

fn default_path() -> String {
    "/webhook".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct WebhookConfig {
    #[serde(default)]
    pub secret: WebhookSecret,
}

/// HMAC key shared with the webhook sender. Never printed.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct WebhookSecret(String);

impl WebhookSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret([redacted])")
    }
}

impl std::fmt::Display for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            f.write_str("(not set)")
        } else {
            f.write_str("********")
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeployConfig {
    #[serde(default = "default_script")]
    pub script: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub overlap: OverlapPolicy,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            script: default_script(),
            args: Vec::new(),
            working_dir: None,
            timeout_secs: None,
            overlap: OverlapPolicy::default(),
        }
    }
}

fn default_script() -> PathBuf {
    PathBuf::from("./deploy.sh")
}

impl DeployConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// What happens when a deploy is requested while another one is running
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Every request starts its own run
    #[default]
    Allow,
    /// Drop requests while a run is in flight
    Reject,
    /// Run one at a time, in the order requests arrived
    Queue,
}

impl std::fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlapPolicy::Allow => write!(f, "allow"),
            OverlapPolicy::Reject => write!(f, "reject"),
            OverlapPolicy::Queue => write!(f, "queue"),
        }
    }
}

impl GlobalConfig {
    /// Load the config file (if any), apply environment overrides and validate
    pub fn resolve_from(path: &Path) -> Result<Self, DeployhookError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, DeployhookError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: GlobalConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(GlobalConfig::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), DeployhookError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Environment variables win over the file
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), DeployhookError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup("WEBHOOK_SECRET") {
            self.webhook.secret = WebhookSecret::new(secret);
        }
        if let Some(host) = lookup("HOST") {
            self.listener.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.listener.port = port
                .trim()
                .parse()
                .map_err(|_| DeployhookError::Config(format!("PORT is not a valid port: {}", port)))?;
        }
        if let Some(script) = lookup("DEPLOY_SCRIPT") {
            self.deploy.script = PathBuf::from(script);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DeployhookError> {
        if self.webhook.secret.is_empty() {
            return Err(DeployhookError::Config(
                "webhook secret is not set (WEBHOOK_SECRET or [webhook].secret)".into(),
            ));
        }
        if !self.listener.path.starts_with('/') {
            return Err(DeployhookError::Config(format!(
                "listener path must start with '/': {}",
                self.listener.path
            )));
        }
        if self.deploy.script.as_os_str().is_empty() {
            return Err(DeployhookError::Config("deploy script is not set".into()));
        }
        if self.deploy.timeout_secs == Some(0) {
            return Err(DeployhookError::Config(
                "deploy timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listener.host, self.listener.port)
    }
}
