pub mod global;
pub mod paths;

pub use global::{DeployConfig, GlobalConfig, ListenerConfig, OverlapPolicy, WebhookSecret};
