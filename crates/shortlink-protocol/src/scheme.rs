//! Signature schemes over the canonical string

use crate::error::{ProtocolError, ProtocolResult};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Configurable name of a signature scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemeKind {
    /// Unkeyed MD5, required for interop with the deployed resolver
    #[default]
    Md5,
    /// HMAC-SHA256 with a shared secret
    HmacSha256,
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Md5 => write!(f, "md5"),
            Self::HmacSha256 => write!(f, "hmac-sha256"),
        }
    }
}

/// A concrete signature scheme, including key material where needed
#[derive(Clone, Default, PartialEq, Eq)]
pub enum SignatureScheme {
    /// `hex(MD5(canonical))`
    #[default]
    Md5,
    /// `hex(HMAC-SHA256(secret, canonical))`
    HmacSha256 {
        /// Shared secret
        secret: Vec<u8>,
    },
}

// Keep secrets out of logs.
impl fmt::Debug for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Md5 => f.write_str("Md5"),
            Self::HmacSha256 { .. } => f.write_str("HmacSha256 { secret: <redacted> }"),
        }
    }
}

impl SignatureScheme {
    /// Build a scheme from its configured kind and optional secret
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MissingSecret`] when HMAC is selected without a
    /// non-empty secret.
    pub fn from_kind(kind: SchemeKind, secret: Option<&str>) -> ProtocolResult<Self> {
        match kind {
            SchemeKind::Md5 => Ok(Self::Md5),
            SchemeKind::HmacSha256 => match secret {
                Some(secret) if !secret.is_empty() => Ok(Self::HmacSha256 {
                    secret: secret.as_bytes().to_vec(),
                }),
                _ => Err(ProtocolError::MissingSecret),
            },
        }
    }

    /// Kind of this scheme
    #[must_use]
    pub const fn kind(&self) -> SchemeKind {
        match self {
            Self::Md5 => SchemeKind::Md5,
            Self::HmacSha256 { .. } => SchemeKind::HmacSha256,
        }
    }

    /// Lowercase hex signature of `canonical`
    #[must_use]
    pub fn sign(&self, canonical: &str) -> String {
        match self {
            Self::Md5 => format!("{:x}", md5::compute(canonical.as_bytes())),
            Self::HmacSha256 { secret } => {
                hex::encode(Self::mac(secret, canonical).finalize().into_bytes())
            }
        }
    }

    /// Check `signature` against `canonical` without early exit on mismatch
    #[must_use]
    pub fn verify(&self, canonical: &str, signature: &str) -> bool {
        match self {
            Self::Md5 => hex::decode(signature).is_ok_and(|raw| {
                md5::compute(canonical.as_bytes())
                    .0
                    .as_slice()
                    .ct_eq(&raw)
                    .into()
            }),
            Self::HmacSha256 { secret } => hex::decode(signature)
                .is_ok_and(|raw| Self::mac(secret, canonical).verify_slice(&raw).is_ok()),
        }
    }

    #[allow(clippy::expect_used)]
    fn mac(secret: &[u8], canonical: &str) -> HmacSha256 {
        let mut mac =
            <HmacSha256 as Mac>::new_from_slice(secret).expect("HMAC can take key of any size");
        mac.update(canonical.as_bytes());
        mac
    }
}
