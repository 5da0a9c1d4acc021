//! Client-side redirect state machine
//!
//! `Pending` moves exactly once, to `Resolved(url)` or `Expired`. Updates
//! that arrive after a terminal state, or after the owning view has been
//! disposed, are dropped.

use crate::error::ProtocolResult;
use crate::request::{ProtocolRevision, RedirectParams, SignedRequest};
use crate::scheme::SignatureScheme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// What happens to a resolved destination URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedMode {
    /// Full navigation to the destination
    #[default]
    Navigate,
    /// Show the destination inside an embedded frame
    Embed,
}

/// State of one redirect attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectState {
    /// Waiting for the resolver
    Pending,
    /// Resolver returned a destination
    Resolved(String),
    /// Parameters missing or resolver refused
    Expired,
}

impl RedirectState {
    /// Whether no further transition is possible
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Shared flag telling an in-flight task whether its view still exists
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Whether the view is still mounted
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Mark the view as gone
    pub fn dispose(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One mounted redirect page
#[derive(Debug)]
pub struct RedirectFlow {
    state: RedirectState,
    liveness: Liveness,
    request: Option<SignedRequest>,
}

impl RedirectFlow {
    /// Mount a flow from inbound URL pieces.
    ///
    /// Missing or malformed parameters land in `Expired` straight away and
    /// no request is produced; otherwise the flow is `Pending` and carries the
    /// signed request to send.
    pub fn mount(
        revision: ProtocolRevision,
        path: Option<(&str, &str)>,
        query: &BTreeMap<String, String>,
        scheme: &SignatureScheme,
        now: i64,
    ) -> (Self, ProtocolResult<()>) {
        let built = RedirectParams::from_inbound(revision, path, query)
            .and_then(|params| SignedRequest::build(revision, params.to_payload(now), scheme));

        match built {
            Ok(request) => (
                Self {
                    state: RedirectState::Pending,
                    liveness: Liveness::new(),
                    request: Some(request),
                },
                Ok(()),
            ),
            Err(error) => (
                Self {
                    state: RedirectState::Expired,
                    liveness: Liveness::new(),
                    request: None,
                },
                Err(error),
            ),
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &RedirectState {
        &self.state
    }

    /// Signed request to send while `Pending`
    #[must_use]
    pub fn request(&self) -> Option<&SignedRequest> {
        match self.state {
            RedirectState::Pending => self.request.as_ref(),
            _ => None,
        }
    }

    /// Handle for the task performing the resolver call
    #[must_use]
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    /// Tear the view down; later completions are ignored
    pub fn dispose(&self) {
        self.liveness.dispose();
    }

    /// Apply the resolver outcome.
    ///
    /// Returns `true` if the state changed. Nothing happens once the flow is
    /// terminal or disposed.
    pub fn complete<E>(&mut self, outcome: Result<String, E>) -> bool {
        if self.state.is_terminal() || !self.liveness.is_alive() {
            return false;
        }
        self.state = match outcome {
            Ok(url) => RedirectState::Resolved(url),
            Err(_) => RedirectState::Expired,
        };
        true
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use pretty_assertions::assert_eq;

    const NOW: i64 = 1_700_000_000;

    fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn mount(pairs: &[(&str, &str)]) -> (RedirectFlow, ProtocolResult<()>) {
        RedirectFlow::mount(
            ProtocolRevision::QueryKey,
            None,
            &query(pairs),
            &SignatureScheme::Md5,
            NOW,
        )
    }

    #[test]
    fn test_missing_key_expires_without_request() {
        let (flow, result) = mount(&[]);

        assert_eq!(flow.state(), &RedirectState::Expired);
        assert!(flow.request().is_none());
        assert_eq!(result, Err(ProtocolError::missing("key")));
    }

    #[test]
    fn test_mount_signs_with_current_time() {
        let (flow, result) = mount(&[("key", "abc123")]);

        assert!(result.is_ok());
        assert_eq!(flow.state(), &RedirectState::Pending);
        let request = flow.request().unwrap();
        assert_eq!(request.canonical_string(), "key=abc123&t=1700000000");
    }

    #[test]
    fn test_resolve_success() {
        let (mut flow, _) = mount(&[("key", "abc")]);

        assert!(flow.complete::<()>(Ok("https://dest.example/x".into())));
        assert_eq!(
            flow.state(),
            &RedirectState::Resolved("https://dest.example/x".into())
        );
        assert!(flow.request().is_none());
    }

    #[test]
    fn test_resolve_failure() {
        let (mut flow, _) = mount(&[("key", "abc")]);

        assert!(flow.complete(Err("expired")));
        assert_eq!(flow.state(), &RedirectState::Expired);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let (mut flow, _) = mount(&[("key", "abc")]);
        flow.complete::<()>(Ok("https://a.example".into()));

        assert!(!flow.complete(Err("late")));
        assert!(!flow.complete::<()>(Ok("https://b.example".into())));
        assert_eq!(flow.state(), &RedirectState::Resolved("https://a.example".into()));

        let (mut expired, _) = mount(&[]);
        assert!(!expired.complete::<()>(Ok("https://a.example".into())));
        assert_eq!(expired.state(), &RedirectState::Expired);
    }

    #[test]
    fn test_late_response_after_dispose_is_ignored() {
        let (mut flow, _) = mount(&[("key", "abc")]);
        let handle = flow.liveness();
        assert!(handle.is_alive());

        flow.dispose();
        assert!(!handle.is_alive());
        assert!(!flow.complete::<()>(Ok("https://dest.example".into())));
        assert_eq!(flow.state(), &RedirectState::Pending);
    }

    #[test]
    fn test_resolved_mode_serde() {
        let mode: ResolvedMode = serde_json::from_str("\"embed\"").unwrap();
        assert_eq!(mode, ResolvedMode::Embed);
        assert_eq!(ResolvedMode::default(), ResolvedMode::Navigate);
    }
}
