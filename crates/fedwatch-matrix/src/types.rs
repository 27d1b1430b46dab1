//! Wire shapes for the parts of the client-server API fedwatch uses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ─── Login ───────────────────────────────────────────────────────────────────

/// `POST /_matrix/client/v3/login` body for password login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    #[serde(rename = "type")]
    pub login_type: &'static str,
    pub identifier: UserIdentifier<'a>,
    pub password: &'a str,
    pub initial_device_display_name: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserIdentifier<'a> {
    #[serde(rename = "type")]
    pub id_type: &'static str,
    pub user: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user_id: String,
    #[serde(default)]
    pub device_id: Option<String>,
}

// ─── Rooms ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct JoinedRoomsResponse {
    pub joined_rooms: Vec<String>,
}

/// `GET /rooms/{roomId}/joined_members`. Only the user IDs are used.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinedMembersResponse {
    pub joined: HashMap<String, serde_json::Value>,
}

/// Content of `m.room.canonical_alias`.
#[derive(Debug, Clone, Deserialize)]
pub struct CanonicalAliasContent {
    #[serde(default)]
    pub alias: Option<String>,
}

/// Content of `m.room.name`.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomNameContent {
    #[serde(default)]
    pub name: Option<String>,
}

/// Display data for a room. Missing parts are filled in by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomMetadata {
    pub alias: Option<String>,
    pub title: Option<String>,
}

// ─── Messages ────────────────────────────────────────────────────────────────

/// Payload for sending a message to a Matrix room via the CS API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixMessageContent {
    pub msgtype: String,
    pub body: String,
}

impl MatrixMessageContent {
    pub fn text(body: impl Into<String>) -> Self {
        Self { msgtype: "m.text".to_owned(), body: body.into() }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Standard Matrix error body: `{"errcode": "...", "error": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub errcode: String,
    #[serde(default)]
    pub error: String,
}
