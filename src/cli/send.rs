use std::path::Path;

use crate::cli::display;
use crate::config::GlobalConfig;
use crate::daemon::protocol::{AckResponse, ErrorResponse};
use crate::daemon::signature::SignatureVerifier;
use crate::daemon::webhook::{DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER};
use crate::error::DeployhookError;

const TEST_PUSH_PAYLOAD: &str =
    r#"{"ref":"refs/heads/main","after":"0000000000000000000000000000000000000000","pusher":{"name":"deployhook"}}"#;

const TEST_PING_PAYLOAD: &str = r#"{"zen":"deployhook test delivery"}"#;

/// Deliver a signed test webhook to a running listener
pub async fn send_test_delivery(
    config_path: &Path,
    url: Option<String>,
    event: &str,
    file: Option<&Path>,
) -> anyhow::Result<()> {
    let config = GlobalConfig::resolve_from(config_path)?;

    let url = url.unwrap_or_else(|| default_url(&config));
    let payload = match file {
        Some(_) => super::read_payload(file).await?,
        None if event.eq_ignore_ascii_case("push") => TEST_PUSH_PAYLOAD.as_bytes().to_vec(),
        None => TEST_PING_PAYLOAD.as_bytes().to_vec(),
    };

    let signature = SignatureVerifier::new(config.webhook.secret.clone()).sign(&payload)?;
    let delivery = uuid::Uuid::new_v4().to_string();

    display::print_field("URL:", &url);
    display::print_field("Event:", event);
    display::print_field("Delivery:", &delivery);

    let response = reqwest::Client::new()
        .post(&url)
        .header("content-type", "application/json")
        .header(EVENT_HEADER, event)
        .header(SIGNATURE_HEADER, signature)
        .header(DELIVERY_HEADER, &delivery)
        .body(payload)
        .send()
        .await
        .map_err(DeployhookError::from)?;

    let status = response.status();
    let body = response.bytes().await.map_err(DeployhookError::from)?;

    if status.is_success() {
        match serde_json::from_slice::<AckResponse>(&body) {
            Ok(ack) => display::print_success(&format!("{} ({} event {})", status, ack.event, ack.status)),
            Err(_) => display::print_success(&status.to_string()),
        }
        Ok(())
    } else {
        let detail = serde_json::from_slice::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
        display::print_error(&format!("{} {}", status, detail));
        Err(DeployhookError::Http(format!("listener answered {}", status)).into())
    }
}

/// Local address of the configured listener
pub fn default_url(config: &GlobalConfig) -> String {
    let host = match config.listener.host.as_str() {
        "0.0.0.0" | "::" | "" => "127.0.0.1",
        host => host,
    };
    format!("http://{}:{}{}", host, config.listener.port, config.listener.path)
}
