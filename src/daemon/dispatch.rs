/// Event type carried in the `X-GitHub-Event` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Push,
    Ping,
    Other(String),
}

impl EventKind {
    /// Case-insensitive; a missing header is just another uninteresting event
    pub fn parse(header: Option<&str>) -> Self {
        let Some(raw) = header.map(str::trim) else {
            return EventKind::Other(String::new());
        };
        if raw.eq_ignore_ascii_case("push") {
            EventKind::Push
        } else if raw.eq_ignore_ascii_case("ping") {
            EventKind::Ping
        } else {
            EventKind::Other(raw.to_ascii_lowercase())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Push => "push",
            EventKind::Ping => "ping",
            EventKind::Other(name) if name.is_empty() => "unknown",
            EventKind::Other(name) => name,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Deploy,
    Ignore,
}

pub fn dispatch(kind: &EventKind) -> Action {
    match kind {
        EventKind::Push => Action::Deploy,
        EventKind::Ping | EventKind::Other(_) => Action::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_deploys_in_any_case() {
        for header in ["push", "PUSH", "Push", " push "] {
            let kind = EventKind::parse(Some(header));
            assert_eq!(kind, EventKind::Push);
            assert_eq!(dispatch(&kind), Action::Deploy);
        }
    }

    #[test]
    fn ping_is_ignored() {
        let kind = EventKind::parse(Some("ping"));
        assert_eq!(kind, EventKind::Ping);
        assert_eq!(dispatch(&kind), Action::Ignore);
    }

    #[test]
    fn other_events_are_ignored() {
        for header in ["pull_request", "release", "pushed", ""] {
            let kind = EventKind::parse(Some(header));
            assert_eq!(dispatch(&kind), Action::Ignore, "{}", header);
        }
        assert_eq!(
            EventKind::parse(Some("Pull_Request")).as_str(),
            "pull_request"
        );
    }

    #[test]
    fn missing_header_is_ignored() {
        let kind = EventKind::parse(None);
        assert_eq!(kind.as_str(), "unknown");
        assert_eq!(dispatch(&kind), Action::Ignore);
    }
}
