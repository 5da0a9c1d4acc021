//! Resolver-side verification of signed redirect requests
//!
//! The redirect page never enforces freshness itself; it forwards `t` and
//! trusts the resolver. This module is what a resolver runs before it
//! discloses a destination URL.

use crate::error::{ProtocolError, ProtocolResult};
use crate::payload::SignablePayload;
use crate::request::{ProtocolRevision, SIGN_FIELD, TIMESTAMP_FIELD};
use crate::scheme::SignatureScheme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accepted age and clock skew of a request timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessWindow {
    /// Maximum age in seconds; `None` disables the expiry check
    #[serde(default)]
    pub max_age_secs: Option<u64>,

    /// How far ahead of the verifier clock `t` may be
    #[serde(default)]
    pub max_skew_secs: u64,
}

impl FreshnessWindow {
    /// Window that accepts any timestamp
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_age_secs: None,
            max_skew_secs: 0,
        }
    }

    /// Check a request timestamp against the verifier clock
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Expired`] or [`ProtocolError::FromFuture`].
    pub fn check(&self, timestamp: i64, now: i64) -> ProtocolResult<()> {
        let age = now.saturating_sub(timestamp);
        if let Some(max_age) = self.max_age_secs
            && age > i64::try_from(max_age).unwrap_or(i64::MAX)
        {
            return Err(ProtocolError::Expired { age, max_age });
        }

        // Only enforced once a window is configured at all.
        if self.max_age_secs.is_some() {
            let skew = timestamp.saturating_sub(now);
            if skew > i64::try_from(self.max_skew_secs).unwrap_or(i64::MAX) {
                return Err(ProtocolError::FromFuture {
                    skew,
                    max_skew: self.max_skew_secs,
                });
            }
        }

        Ok(())
    }
}

/// A request that passed verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedRequest {
    /// Verified parameters, `sign` removed
    pub payload: SignablePayload,
    /// Client timestamp
    pub timestamp: i64,
}

impl VerifiedRequest {
    /// Text value of a verified parameter
    #[must_use]
    pub fn param(&self, name: &str) -> Option<String> {
        self.payload.get(name).map(ToString::to_string)
    }
}

/// Verifies incoming signed requests
#[derive(Debug, Clone)]
pub struct Verifier {
    revision: ProtocolRevision,
    scheme: SignatureScheme,
    window: FreshnessWindow,
}

impl Verifier {
    /// Create a verifier for one protocol revision
    #[must_use]
    pub const fn new(
        revision: ProtocolRevision,
        scheme: SignatureScheme,
        window: FreshnessWindow,
    ) -> Self {
        Self {
            revision,
            scheme,
            window,
        }
    }

    /// Verify query parameters as received by the resolver.
    ///
    /// Values are taken verbatim as text: the canonical string is rebuilt
    /// from exactly what was sent.
    ///
    /// # Errors
    ///
    /// Missing fields, a non-integer `t`, a bad signature or a timestamp
    /// outside the window.
    pub fn verify(&self, query: &BTreeMap<String, String>, now: i64) -> ProtocolResult<VerifiedRequest> {
        let sign = query
            .get(SIGN_FIELD)
            .filter(|sign| !sign.is_empty())
            .ok_or_else(|| ProtocolError::missing(SIGN_FIELD))?;

        let payload: SignablePayload = query
            .iter()
            .filter(|(name, _)| name.as_str() != SIGN_FIELD)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        self.revision.check(&payload)?;

        let timestamp = payload
            .get(TIMESTAMP_FIELD)
            .and_then(crate::payload::ParamValue::as_int)
            .ok_or_else(|| ProtocolError::invalid(TIMESTAMP_FIELD, "not an integer"))?;

        if !self.scheme.verify(&payload.canonical_string(), sign) {
            return Err(ProtocolError::SignatureMismatch);
        }

        self.window.check(timestamp, now)?;

        Ok(VerifiedRequest { payload, timestamp })
    }
}
