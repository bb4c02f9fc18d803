//! Identifier codec.
//!
//! Hierarchical namespaces travel as a single path segment: components joined
//! by the ASCII unit separator `0x1F`. Components are not escaped, so a
//! component containing `0x1F` cannot round-trip.

use std::borrow::Cow;

use floe_catalog::NamespaceIdent;

use crate::error::{RestError, RestResult};

/// Namespace component separator.
pub const SEPARATOR: char = '\u{1F}';

/// Joins namespace components with [`SEPARATOR`].
#[must_use]
pub fn encode(parts: &[String]) -> String {
    let mut buf = [0u8; 4];
    parts.join(SEPARATOR.encode_utf8(&mut buf))
}

/// Splits a flattened namespace on [`SEPARATOR`].
///
/// `decode("")` is `[""]`; callers that forbid empty components validate
/// separately.
#[must_use]
pub fn decode(flat: &str) -> Vec<String> {
    flat.split(SEPARATOR).map(str::to_string).collect()
}

/// Percent-encoded separators can survive a single URL decode; fold them into
/// the raw byte.
fn normalize(raw: &str) -> Cow<'_, str> {
    if raw.contains("%1F") || raw.contains("%1f") {
        Cow::Owned(raw.replace("%1F", "\u{1F}").replace("%1f", "\u{1F}"))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Parses a namespace path segment. Every component must be non-empty.
///
/// # Errors
///
/// Returns a malformed request error for empty components.
pub fn parse_namespace(raw: &str) -> RestResult<NamespaceIdent> {
    let parts = decode(&normalize(raw));
    validate_namespace(&parts)?;
    Ok(parts)
}

/// Parses the optional `parent` query value. An absent or empty value means
/// no parent.
///
/// # Errors
///
/// Returns a malformed request error for empty components.
pub fn parse_parent(raw: Option<&str>) -> RestResult<Option<NamespaceIdent>> {
    raw.filter(|p| !p.is_empty()).map(parse_namespace).transpose()
}

/// Rejects empty namespaces and empty components.
///
/// # Errors
///
/// Returns a malformed request error describing the problem.
pub fn validate_namespace(parts: &[String]) -> RestResult<()> {
    if parts.is_empty() {
        return Err(RestError::malformed("Namespace cannot be empty"));
    }
    if parts.iter().any(String::is_empty) {
        return Err(RestError::malformed(format!(
            "Invalid namespace: {parts:?} contains an empty component"
        )));
    }
    Ok(())
}

/// Rejects empty table names.
///
/// # Errors
///
/// Returns a malformed request error for an empty name.
pub fn validate_table_name(name: &str) -> RestResult<()> {
    if name.is_empty() {
        return Err(RestError::malformed("Table name cannot be empty"));
    }
    Ok(())
}
