use serde::{Deserialize, Serialize};

use crate::daemon::dispatch::{Action, EventKind};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AckResponse {
    /// `accepted` once a deploy is handed to the scheduler, `ignored` otherwise
    pub status: String,
    pub event: String,
}

impl AckResponse {
    pub fn new(kind: &EventKind, action: Action) -> Self {
        let status = match action {
            Action::Deploy => "accepted",
            Action::Ignore => "ignored",
        };
        Self {
            status: status.to_string(),
            event: kind.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
