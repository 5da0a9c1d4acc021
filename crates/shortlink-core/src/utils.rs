//! Utility functions for the short-link console

use crate::Result;
use crate::types::MAX_STATISTICS_KEYS;
use chrono::Utc;
use url::Url;

/// Lowercase hex MD5 of `input`
#[must_use]
pub fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Digest a plaintext password the way the resource API expects it
#[must_use]
pub fn hash_password(plain: &str) -> String {
    md5_hex(plain)
}

/// Current Unix time in seconds
#[must_use]
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Split a multi-line key list into trimmed, non-empty keys
///
/// # Errors
///
/// Returns a validation error if no key remains or more than
/// [`MAX_STATISTICS_KEYS`] are given.
pub fn parse_statistics_keys(input: &str) -> Result<Vec<String>> {
    let keys: Vec<String> = input
        .lines()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(ToString::to_string)
        .collect();

    if keys.is_empty() {
        return Err(crate::Error::Validation {
            field: "keys".to_string(),
            message: "at least one key is required".to_string(),
        });
    }
    if keys.len() > MAX_STATISTICS_KEYS {
        return Err(crate::Error::Validation {
            field: "keys".to_string(),
            message: format!(
                "at most {MAX_STATISTICS_KEYS} keys per query, got {}",
                keys.len()
            ),
        });
    }
    Ok(keys)
}

/// Page to show after deleting a row.
///
/// Steps back one page when the current page came back empty and is not
/// the first.
#[must_use]
pub const fn page_after_delete(page: u32, rows_left: usize) -> u32 {
    if rows_left == 0 && page > 1 { page - 1 } else { page }
}

/// Whether a resolved destination is safe to navigate to or embed.
///
/// The URL must parse as absolute `http`/`https` with a host. Control
/// characters are refused outright since the parser silently drops tabs and
/// newlines.
#[must_use]
pub fn is_http_url(url: &str) -> bool {
    if url.chars().any(char::is_control) {
        return false;
    }
    Url::parse(url).is_ok_and(|parsed| {
        matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
    })
}
