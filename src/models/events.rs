use serde::Deserialize;

/// The few push-payload fields worth logging. Every field is optional so a
/// non-GitHub or truncated body still parses.
#[derive(Debug, Default, Deserialize)]
pub struct PushSummary {
    #[serde(rename = "ref", default)]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub repository: Option<GitHubRepository>,
    #[serde(default)]
    pub pusher: Option<GitHubPusher>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GitHubRepository {
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GitHubPusher {
    #[serde(default)]
    pub name: Option<String>,
}

impl PushSummary {
    /// Parsed from an already-verified body; never used for verification
    pub fn from_payload(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    pub fn repository_name(&self) -> Option<&str> {
        self.repository.as_ref()?.full_name.as_deref()
    }

    pub fn pusher_name(&self) -> Option<&str> {
        self.pusher.as_ref()?.name.as_deref()
    }

    pub fn short_sha(&self) -> Option<&str> {
        self.after.as_deref().map(crate::utils::short_sha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_push_fields() {
        let body = br#"{
            "ref": "refs/heads/main",
            "after": "0123456789abcdef0123456789abcdef01234567",
            "repository": {"full_name": "abhi/bookstore", "private": false},
            "pusher": {"name": "abhi", "email": "a@example.com"}
        }"#;
        let summary = PushSummary::from_payload(body);
        assert_eq!(summary.git_ref.as_deref(), Some("refs/heads/main"));
        assert_eq!(summary.short_sha(), Some("0123456"));
        assert_eq!(summary.repository_name(), Some("abhi/bookstore"));
        assert_eq!(summary.pusher_name(), Some("abhi"));
    }

    #[test]
    fn minimal_body() {
        let summary = PushSummary::from_payload(br#"{"ref":"refs/heads/main"}"#);
        assert_eq!(summary.git_ref.as_deref(), Some("refs/heads/main"));
        assert!(summary.short_sha().is_none());
        assert!(summary.repository_name().is_none());
    }

    #[test]
    fn partial_nested_objects_keep_the_ref() {
        let summary = PushSummary::from_payload(
            br#"{"ref":"refs/heads/main","repository":{"id":42},"pusher":{"email":"a@example.com"}}"#,
        );
        assert_eq!(summary.git_ref.as_deref(), Some("refs/heads/main"));
        assert!(summary.repository_name().is_none());
        assert!(summary.pusher_name().is_none());
    }

    #[test]
    fn non_json_body_is_empty() {
        let summary = PushSummary::from_payload(b"payload=%7B%7D");
        assert!(summary.git_ref.is_none());
    }
}
