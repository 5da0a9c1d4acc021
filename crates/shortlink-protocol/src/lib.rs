//! Signed short-link redirect protocol
//!
//! Pure logic, no async or I/O: parameter canonicalization, signing,
//! resolver-side verification and the redirect page state machine.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod error;
pub mod flow;
pub mod payload;
pub mod request;
pub mod scheme;
pub mod verify;

pub use error::{ProtocolError, ProtocolResult};
pub use flow::{Liveness, RedirectFlow, RedirectState, ResolvedMode};
pub use payload::{ParamValue, SignablePayload};
pub use request::{ProtocolRevision, RedirectParams, SIGN_FIELD, SignedRequest, TIMESTAMP_FIELD};
pub use scheme::{SchemeKind, SignatureScheme};
pub use verify::{FreshnessWindow, VerifiedRequest, Verifier};
