#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use deployhook::config::{GlobalConfig, WebhookSecret};
use deployhook::daemon::scheduler::Job;
use deployhook::daemon::server::create_router;
use deployhook::daemon::signature::SignatureVerifier;
use deployhook::daemon::DaemonState;
use http_body_util::BodyExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const SECRET: &str = "Abhi07";
pub const PUSH_BODY: &str = r#"{"ref":"refs/heads/main"}"#;

pub fn test_config(secret: &str) -> GlobalConfig {
    let mut config = GlobalConfig::default();
    config.webhook.secret = WebhookSecret::new(secret);
    config.listener.max_body_bytes = 64 * 1024;
    config
}

/// Router whose scheduler side is a plain receiver, so tests can count queued deploys
pub fn spy_app(config: GlobalConfig) -> (Router, mpsc::Receiver<Job>) {
    let (tx, rx) = mpsc::channel(16);
    let state = Arc::new(DaemonState::new(config, tx));
    (create_router(state), rx)
}

pub fn sign(secret: &str, body: &[u8]) -> String {
    SignatureVerifier::new(WebhookSecret::new(secret))
        .sign(body)
        .unwrap()
}

pub struct Delivery<'a> {
    pub event: Option<&'a str>,
    pub signature: Option<String>,
    pub delivery_id: Option<&'a str>,
    pub body: Vec<u8>,
}

impl<'a> Delivery<'a> {
    /// Correctly signed delivery of `body`
    pub fn signed(event: &'a str, body: &[u8]) -> Self {
        Self {
            event: Some(event),
            signature: Some(sign(SECRET, body)),
            delivery_id: None,
            body: body.to_vec(),
        }
    }

    pub fn request(self, uri: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(event) = self.event {
            builder = builder.header("x-github-event", event);
        }
        if let Some(signature) = self.signature {
            builder = builder.header("x-hub-signature-256", signature);
        }
        if let Some(id) = self.delivery_id {
            builder = builder.header("x-github-delivery", id);
        }
        builder.body(Body::from(self.body)).expect("request")
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("response")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

/// Number of jobs sitting in the channel
pub fn drain(rx: &mut mpsc::Receiver<Job>) -> Vec<Job> {
    let mut jobs = Vec::new();
    while let Ok(job) = rx.try_recv() {
        jobs.push(job);
    }
    jobs
}
