//! Signed requests and the revision-aware request builder

use crate::error::{ProtocolError, ProtocolResult};
use crate::payload::{ParamValue, SignablePayload};
use crate::scheme::SignatureScheme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the signature field appended to a payload
pub const SIGN_FIELD: &str = "sign";
/// Client timestamp field
pub const TIMESTAMP_FIELD: &str = "t";

/// Inbound URL scheme and parameter set of a deployment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolRevision {
    /// `/s?key=...`, signs `{key, t}`
    #[default]
    QueryKey,
    /// `/s/:token/:md5_str?t=...`, signs `{md5_str, t, t1, token}`
    PathToken,
}

impl ProtocolRevision {
    /// Parameters that must be present and non-empty before signing
    #[must_use]
    pub const fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::QueryKey => &["key", TIMESTAMP_FIELD],
            Self::PathToken => &["token", "md5_str", TIMESTAMP_FIELD],
        }
    }

    /// Check that `payload` carries everything this revision needs
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MissingParameter`] naming the first absent field.
    pub fn check(self, payload: &SignablePayload) -> ProtocolResult<()> {
        self.required_fields()
            .iter()
            .find(|name| !payload.has_value(name))
            .map_or(Ok(()), |name| Err(ProtocolError::missing(*name)))
    }
}

impl fmt::Display for ProtocolRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryKey => write!(f, "query_key"),
            Self::PathToken => write!(f, "path_token"),
        }
    }
}

/// Parameters read from an inbound redirect URL, before timestamping
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectParams {
    /// Query-key revision
    QueryKey {
        /// Opaque config key
        key: String,
    },
    /// Path-token revision
    PathToken {
        /// Path token
        token: String,
        /// Path digest segment
        md5_str: String,
        /// Issuance timestamp carried in the link
        issued_at: i64,
    },
}

impl RedirectParams {
    /// Extract parameters for `revision` from the inbound URL pieces.
    ///
    /// `path` holds the `(token, md5_str)` segments when the route has them.
    ///
    /// # Errors
    ///
    /// Fails when any required piece is absent, empty, or (for `t`) not an
    /// integer.
    pub fn from_inbound(
        revision: ProtocolRevision,
        path: Option<(&str, &str)>,
        query: &BTreeMap<String, String>,
    ) -> ProtocolResult<Self> {
        match revision {
            ProtocolRevision::QueryKey => {
                let key = non_empty(query.get("key").map(String::as_str), "key")?;
                Ok(Self::QueryKey { key })
            }
            ProtocolRevision::PathToken => {
                let (token, md5_str) = path.ok_or_else(|| ProtocolError::missing("token"))?;
                let token = non_empty(Some(token), "token")?;
                let md5_str = non_empty(Some(md5_str), "md5_str")?;
                let issued_at = non_empty(query.get(TIMESTAMP_FIELD).map(String::as_str), TIMESTAMP_FIELD)?
                    .parse::<i64>()
                    .map_err(|_| ProtocolError::invalid(TIMESTAMP_FIELD, "not an integer"))?;
                Ok(Self::PathToken {
                    token,
                    md5_str,
                    issued_at,
                })
            }
        }
    }

    /// Revision these parameters belong to
    #[must_use]
    pub const fn revision(&self) -> ProtocolRevision {
        match self {
            Self::QueryKey { .. } => ProtocolRevision::QueryKey,
            Self::PathToken { .. } => ProtocolRevision::PathToken,
        }
    }

    /// Payload stamped with the client clock `now` (Unix seconds)
    #[must_use]
    pub fn to_payload(&self, now: i64) -> SignablePayload {
        match self {
            Self::QueryKey { key } => SignablePayload::new()
                .with("key", key.as_str())
                .with(TIMESTAMP_FIELD, now),
            Self::PathToken {
                token,
                md5_str,
                issued_at,
            } => SignablePayload::new()
                .with("token", token.as_str())
                .with("md5_str", md5_str.as_str())
                .with("t1", *issued_at)
                .with(TIMESTAMP_FIELD, now),
        }
    }
}

fn non_empty(value: Option<&str>, name: &str) -> ProtocolResult<String> {
    match value {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ProtocolError::missing(name)),
    }
}

/// A payload together with its signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    payload: SignablePayload,
    sign: String,
}

impl SignedRequest {
    /// Sign `payload` as-is.
    ///
    /// A `sign` entry already in the payload is dropped first so the signature
    /// never covers itself.
    #[must_use]
    pub fn sign(mut payload: SignablePayload, scheme: &SignatureScheme) -> Self {
        payload.remove(SIGN_FIELD);
        let sign = scheme.sign(&payload.canonical_string());
        Self { payload, sign }
    }

    /// Validate `payload` against `revision`, then sign it
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MissingParameter`] if a required field is absent.
    pub fn build(
        revision: ProtocolRevision,
        payload: SignablePayload,
        scheme: &SignatureScheme,
    ) -> ProtocolResult<Self> {
        revision.check(&payload)?;
        Ok(Self::sign(payload, scheme))
    }

    /// Signed parameters
    #[must_use]
    pub const fn payload(&self) -> &SignablePayload {
        &self.payload
    }

    /// Hex signature
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.sign
    }

    /// Canonical string the signature covers
    #[must_use]
    pub fn canonical_string(&self) -> String {
        self.payload.canonical_string()
    }

    /// All fields, `sign` last, ready to be sent as query parameters
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.payload
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .chain(std::iter::once((SIGN_FIELD.to_string(), self.sign.clone())))
            .collect()
    }
}

impl Serialize for SignedRequest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.payload.len() + 1))?;
        for (name, value) in self.payload.iter() {
            match value {
                ParamValue::Int(int) => map.serialize_entry(name, int)?,
                ParamValue::Text(text) => map.serialize_entry(name, text)?,
            }
        }
        map.serialize_entry(SIGN_FIELD, &self.sign)?;
        map.end()
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_known_query_key_signature() {
        let payload = SignablePayload::new()
            .with("key", "abc123")
            .with("t", 1_700_000_000);
        let request =
            SignedRequest::build(ProtocolRevision::QueryKey, payload, &SignatureScheme::Md5).unwrap();

        assert_eq!(request.canonical_string(), "key=abc123&t=1700000000");
        assert_eq!(
            request.signature(),
            format!("{:x}", md5::compute("key=abc123&t=1700000000"))
        );
    }

    #[test]
    fn test_build_is_idempotent() {
        let payload = SignablePayload::new().with("key", "k").with("t", 42);
        let first =
            SignedRequest::build(ProtocolRevision::QueryKey, payload.clone(), &SignatureScheme::Md5).unwrap();
        let second =
            SignedRequest::build(ProtocolRevision::QueryKey, payload, &SignatureScheme::Md5).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.query_pairs(), second.query_pairs());
    }

    #[test]
    fn test_any_value_change_changes_sign() {
        let base = SignedRequest::sign(
            SignablePayload::new().with("key", "abc").with("t", 100),
            &SignatureScheme::Md5,
        );
        let other_t = SignedRequest::sign(
            SignablePayload::new().with("key", "abc").with("t", 101),
            &SignatureScheme::Md5,
        );
        let other_key = SignedRequest::sign(
            SignablePayload::new().with("key", "abd").with("t", 100),
            &SignatureScheme::Md5,
        );

        assert_ne!(base.signature(), other_t.signature());
        assert_ne!(base.signature(), other_key.signature());
    }

    #[test]
    fn test_sign_never_covers_itself() {
        let payload = SignablePayload::new()
            .with("key", "abc")
            .with("t", 1)
            .with(SIGN_FIELD, "forged");
        let request = SignedRequest::sign(payload, &SignatureScheme::Md5);

        assert_eq!(request.canonical_string(), "key=abc&t=1");
    }

    #[test]
    fn test_build_requires_key_and_t() {
        let missing_key = SignablePayload::new().with("t", 1);
        assert_eq!(
            SignedRequest::build(ProtocolRevision::QueryKey, missing_key, &SignatureScheme::Md5),
            Err(ProtocolError::missing("key"))
        );

        let empty_key = SignablePayload::new().with("key", "").with("t", 1);
        assert_eq!(
            SignedRequest::build(ProtocolRevision::QueryKey, empty_key, &SignatureScheme::Md5),
            Err(ProtocolError::missing("key"))
        );

        let missing_t = SignablePayload::new().with("key", "abc");
        assert_eq!(
            SignedRequest::build(ProtocolRevision::QueryKey, missing_t, &SignatureScheme::Md5),
            Err(ProtocolError::missing("t"))
        );
    }

    #[test]
    fn test_query_pairs_order() {
        let request = SignedRequest::sign(
            SignablePayload::new().with("t", 5).with("key", "abc"),
            &SignatureScheme::Md5,
        );
        let names: Vec<String> = request.query_pairs().into_iter().map(|(k, _)| k).collect();

        assert_eq!(names, vec!["key", "t", "sign"]);
    }

    #[test]
    fn test_serialize_flat() {
        let request = SignedRequest::sign(
            SignablePayload::new().with("key", "abc").with("t", 5),
            &SignatureScheme::Md5,
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["key"], "abc");
        assert_eq!(json["t"], 5);
        assert_eq!(json["sign"], request.signature());
    }

    #[test]
    fn test_query_key_params() {
        let params =
            RedirectParams::from_inbound(ProtocolRevision::QueryKey, None, &query(&[("key", "abc")]))
                .unwrap();
        assert_eq!(params, RedirectParams::QueryKey { key: "abc".into() });

        let payload = params.to_payload(1_700_000_000);
        assert_eq!(payload.canonical_string(), "key=abc&t=1700000000");
    }

    #[test]
    fn test_query_key_missing_or_empty() {
        assert_eq!(
            RedirectParams::from_inbound(ProtocolRevision::QueryKey, None, &query(&[])),
            Err(ProtocolError::missing("key"))
        );
        assert_eq!(
            RedirectParams::from_inbound(ProtocolRevision::QueryKey, None, &query(&[("key", "")])),
            Err(ProtocolError::missing("key"))
        );
    }

    #[test]
    fn test_path_token_params() {
        let params = RedirectParams::from_inbound(
            ProtocolRevision::PathToken,
            Some(("tok", "d41d8c")),
            &query(&[("t", "1699999000")]),
        )
        .unwrap();

        assert_eq!(params.revision(), ProtocolRevision::PathToken);
        let payload = params.to_payload(1_700_000_000);
        assert_eq!(
            payload.canonical_string(),
            "md5_str=d41d8c&t=1700000000&t1=1699999000&token=tok"
        );
        assert!(ProtocolRevision::PathToken.check(&payload).is_ok());
    }

    #[test]
    fn test_path_token_rejects_bad_timestamp() {
        assert_eq!(
            RedirectParams::from_inbound(
                ProtocolRevision::PathToken,
                Some(("tok", "abc")),
                &query(&[("t", "soon")]),
            ),
            Err(ProtocolError::invalid("t", "not an integer"))
        );
        assert_eq!(
            RedirectParams::from_inbound(ProtocolRevision::PathToken, Some(("tok", "abc")), &query(&[])),
            Err(ProtocolError::missing("t"))
        );
        assert_eq!(
            RedirectParams::from_inbound(ProtocolRevision::PathToken, None, &query(&[("t", "1")])),
            Err(ProtocolError::missing("token"))
        );
    }
}
