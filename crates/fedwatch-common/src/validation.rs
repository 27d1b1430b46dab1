//! Identifier helpers.
//!
//! Participant and room identifiers have the shape `<sigil><local>:<server>`.
//! Only the server part matters for federation checks.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigError;

// Localpart grammar for user IDs: lowercase letters, digits, and `._=-/+`.
static USER_LOCALPART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._=/+\-]+$").expect("static regex"));

// Server name: DNS name, IPv4 literal or bracketed IPv6 literal, optional port.
static SERVER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\[[0-9A-Fa-f:.]+\]|[A-Za-z0-9\-.]+)(:[0-9]{1,5})?$").expect("static regex")
});

/// Return the part of `participant_id` after its first `:`.
///
/// Identifiers without a separator yield `""`; callers skip those.
pub fn extract_domain(participant_id: &str) -> &str {
    participant_id
        .split_once(':')
        .map(|(_, domain)| domain)
        .unwrap_or("")
}

/// Validate a full user ID such as `@fedwatch:example.org`.
pub fn validate_user_id(user_id: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidUserId {
        value: user_id.to_owned(),
        reason: reason.to_owned(),
    };

    let rest = user_id
        .strip_prefix('@')
        .ok_or_else(|| invalid("must start with '@'"))?;
    let (localpart, server) = rest
        .split_once(':')
        .ok_or_else(|| invalid("missing ':' between localpart and server name"))?;

    if !USER_LOCALPART.is_match(localpart) {
        return Err(invalid("localpart may only contain a-z, 0-9 and ._=-/+"));
    }
    if !SERVER_NAME.is_match(server) {
        return Err(invalid("server name is not a valid host[:port]"));
    }
    if user_id.len() > 255 {
        return Err(invalid("longer than 255 bytes"));
    }
    Ok(())
}

/// Validate a room ID such as `!abcdef:example.org`.
pub fn validate_room_id(room_id: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidRoomId {
        value: room_id.to_owned(),
        reason: reason.to_owned(),
    };

    let rest = room_id
        .strip_prefix('!')
        .ok_or_else(|| invalid("must start with '!'"))?;
    let (opaque, server) = rest
        .split_once(':')
        .ok_or_else(|| invalid("missing ':' before server name"))?;

    if opaque.is_empty() {
        return Err(invalid("empty opaque part"));
    }
    if !SERVER_NAME.is_match(server) {
        return Err(invalid("server name is not a valid host[:port]"));
    }
    Ok(())
}
