//! Matrix client-server API client.
//!
//! Logs in once with a password and keeps the access token for every later
//! request. Only the handful of endpoints the monitor needs are covered.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    error::{MatrixError, Result},
    homeserver::Homeserver,
    types::{
        CanonicalAliasContent, ErrorBody, JoinedMembersResponse, JoinedRoomsResponse,
        LoginRequest, LoginResponse, MatrixMessageContent, RoomMetadata, RoomNameContent,
        UserIdentifier,
    },
};

const CLIENT_API: &str = "/_matrix/client/v3";

// ─── Client ──────────────────────────────────────────────────────────────────

/// Authenticated session on the monitoring account's homeserver.
pub struct MatrixClient {
    homeserver_url: String,
    access_token: String,
    user_id: String,
    http: Client,
}

impl MatrixClient {
    /// Log in with `m.login.password` and return a ready client.
    ///
    /// `server_name` may be a bare host (`matrix.example.org`) or a full base URL.
    pub async fn login(server_name: &str, username: &str, password: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("fedwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let homeserver_url = homeserver_url(server_name);

        let body = LoginRequest {
            login_type: "m.login.password",
            identifier: UserIdentifier { id_type: "m.id.user", user: username },
            password,
            initial_device_display_name: "fedwatch",
        };
        let url = format!("{}{}/login", homeserver_url, CLIENT_API);
        debug!("Matrix POST {}", url);
        let resp = http.post(&url).json(&body).send().await?;
        let session: LoginResponse = decode(resp).await?;

        if session.access_token.is_empty() {
            return Err(MatrixError::Login("homeserver returned an empty access token".into()));
        }
        info!(
            "Logged in to {} as {} (device {})",
            homeserver_url,
            session.user_id,
            session.device_id.as_deref().unwrap_or("-")
        );

        Ok(Self {
            homeserver_url,
            access_token: session.access_token,
            user_id: session.user_id,
            http,
        })
    }

    /// The user ID the homeserver assigned to this session.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    // ── Internal ──────────────────────────────────────────────────────────────

    async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let url = format!("{}{}{}", self.homeserver_url, CLIENT_API, path);
        debug!("Matrix {} {}", method, url);
        let mut req = self.http.request(method, &url).bearer_auth(&self.access_token);
        if let Some(b) = body {
            req = req.json(b);
        }
        decode(req.send().await?).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// Fetch a state event's content, treating `404` as "not set".
    async fn optional_state<T: DeserializeOwned>(
        &self,
        room_id: &str,
        event_type: &str,
    ) -> Result<Option<T>> {
        let path = format!("/rooms/{}/state/{}", urlencoded(room_id), event_type);
        match self.get(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(MatrixError::Homeserver { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Homeserver for MatrixClient {
    async fn joined_rooms(&self) -> Result<Vec<String>> {
        let resp: JoinedRoomsResponse = self.get("/joined_rooms").await?;
        Ok(resp.joined_rooms)
    }

    async fn room_metadata(&self, room_id: &str) -> Result<RoomMetadata> {
        let alias = self
            .optional_state::<CanonicalAliasContent>(room_id, "m.room.canonical_alias")
            .await
            .unwrap_or_else(|e| {
                warn!("Canonical alias of {} unavailable: {}", room_id, e);
                None
            })
            .and_then(|c| c.alias)
            .filter(|a| !a.is_empty());
        let title = self
            .optional_state::<RoomNameContent>(room_id, "m.room.name")
            .await
            .unwrap_or_else(|e| {
                warn!("Name of {} unavailable: {}", room_id, e);
                None
            })
            .and_then(|c| c.name)
            .filter(|n| !n.is_empty());
        Ok(RoomMetadata { alias, title })
    }

    async fn joined_members(&self, room_id: &str) -> Result<Vec<String>> {
        let path = format!("/rooms/{}/joined_members", urlencoded(room_id));
        let resp: JoinedMembersResponse = self.get(&path).await?;
        Ok(resp.joined.into_keys().collect())
    }

    async fn send_text(&self, room_id: &str, text: &str) -> Result<()> {
        let txn_id = uuid::Uuid::new_v4().simple().to_string();
        let path = format!("/rooms/{}/send/m.room.message/{}", urlencoded(room_id), txn_id);
        let _: serde_json::Value = self.put(&path, &MatrixMessageContent::text(text)).await?;
        Ok(())
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Base URL for a configured server name. Bare hosts get `https://`.
pub fn homeserver_url(server_name: &str) -> String {
    let trimmed = server_name.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_owned()
    } else {
        format!("https://{}", trimmed)
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body: ErrorBody = resp.json().await.unwrap_or_default();
        return Err(MatrixError::Homeserver {
            status: status.as_u16(),
            errcode: if body.errcode.is_empty() { "M_UNKNOWN".to_owned() } else { body.errcode },
            message: if body.error.is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_owned()
            } else {
                body.error
            },
        });
    }
    let bytes = resp.bytes().await?;
    if status == StatusCode::NO_CONTENT || bytes.is_empty() {
        return Ok(serde_json::from_value(serde_json::Value::Null)?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

fn urlencoded(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post, put},
        Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;

    #[derive(Clone, Default)]
    struct Fake {
        sent: Arc<Mutex<Vec<(String, Value)>>>,
    }

    fn authorised(headers: &HeaderMap) -> bool {
        headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer tok123")
    }

    async fn fake_homeserver(fake: Fake) -> SocketAddr {
        let router = Router::new()
            .route(
                "/_matrix/client/v3/login",
                post(|Json(body): Json<Value>| async move {
                    if body["password"] == "secret" && body["identifier"]["user"] == "@bot:x.org" {
                        (StatusCode::OK, Json(json!({ "access_token": "tok123", "user_id": "@bot:x.org", "device_id": "DEV" })))
                    } else {
                        (StatusCode::FORBIDDEN, Json(json!({ "errcode": "M_FORBIDDEN", "error": "Invalid password" })))
                    }
                }),
            )
            .route(
                "/_matrix/client/v3/joined_rooms",
                get(|headers: HeaderMap| async move {
                    if !authorised(&headers) {
                        return (StatusCode::UNAUTHORIZED, Json(json!({ "errcode": "M_MISSING_TOKEN" })));
                    }
                    (StatusCode::OK, Json(json!({ "joined_rooms": ["!log:x.org", "!a:x.org"] })))
                }),
            )
            .route(
                "/_matrix/client/v3/rooms/{room_id}/joined_members",
                get(|Path(room_id): Path<String>| async move {
                    assert_eq!(room_id, "!a:x.org");
                    Json(json!({ "joined": {
                        "@u1:good.org": { "display_name": "u1" },
                        "@u2:bad.org": {}
                    }}))
                }),
            )
            .route(
                "/_matrix/client/v3/rooms/{room_id}/state/{event_type}",
                get(|Path((room_id, event_type)): Path<(String, String)>| async move {
                    match (room_id.as_str(), event_type.as_str()) {
                        ("!a:x.org", "m.room.canonical_alias") => {
                            (StatusCode::OK, Json(json!({ "alias": "#a:x.org" })))
                        }
                        ("!a:x.org", "m.room.name") => (StatusCode::OK, Json(json!({ "name": "Room A" }))),
                        ("!private:x.org", "m.room.canonical_alias") => {
                            (StatusCode::FORBIDDEN, Json(json!({ "errcode": "M_FORBIDDEN", "error": "Not allowed" })))
                        }
                        ("!private:x.org", "m.room.name") => {
                            (StatusCode::OK, Json(json!({ "name": "Private Room" })))
                        }
                        ("!broken:x.org", _) => (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(json!({ "errcode": "M_UNKNOWN", "error": "boom" })),
                        ),
                        _ => (StatusCode::NOT_FOUND, Json(json!({ "errcode": "M_NOT_FOUND" }))),
                    }
                }),
            )
            .route(
                "/_matrix/client/v3/rooms/{room_id}/send/m.room.message/{txn_id}",
                put(
                    |State(fake): State<Fake>,
                     Path((room_id, _txn)): Path<(String, String)>,
                     Json(body): Json<Value>| async move {
                        fake.sent.lock().unwrap().push((room_id, body));
                        Json(json!({ "event_id": "$evt" }))
                    },
                ),
            )
            .with_state(fake);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    async fn logged_in(fake: Fake) -> MatrixClient {
        let addr = fake_homeserver(fake).await;
        MatrixClient::login(&format!("http://{addr}"), "@bot:x.org", "secret").await.unwrap()
    }

    #[test]
    fn bare_server_name_gets_https() {
        assert_eq!(homeserver_url("matrix.example.org"), "https://matrix.example.org");
        assert_eq!(homeserver_url("http://localhost:8008/"), "http://localhost:8008");
    }

    #[tokio::test]
    async fn login_keeps_session() {
        let client = logged_in(Fake::default()).await;
        assert_eq!(client.user_id(), "@bot:x.org");
    }

    #[tokio::test]
    async fn wrong_password_surfaces_errcode() {
        let addr = fake_homeserver(Fake::default()).await;
        let err = MatrixClient::login(&format!("http://{addr}"), "@bot:x.org", "nope")
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            MatrixError::Homeserver { status: 403, ref errcode, .. } if errcode == "M_FORBIDDEN"
        ));
    }

    #[tokio::test]
    async fn lists_rooms_and_members() {
        let client = logged_in(Fake::default()).await;
        assert_eq!(client.joined_rooms().await.unwrap(), vec!["!log:x.org", "!a:x.org"]);

        let mut members = client.joined_members("!a:x.org").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["@u1:good.org", "@u2:bad.org"]);
    }

    #[tokio::test]
    async fn metadata_treats_missing_state_as_absent() {
        let client = logged_in(Fake::default()).await;
        let meta = client.room_metadata("!a:x.org").await.unwrap();
        assert_eq!(meta.alias.as_deref(), Some("#a:x.org"));
        assert_eq!(meta.title.as_deref(), Some("Room A"));

        let bare = client.room_metadata("!b:x.org").await.unwrap();
        assert_eq!(bare, RoomMetadata::default());
    }

    #[tokio::test]
    async fn forbidden_alias_still_returns_title() {
        let client = logged_in(Fake::default()).await;
        let meta = client.room_metadata("!private:x.org").await.unwrap();
        assert_eq!(meta.alias, None);
        assert_eq!(meta.title.as_deref(), Some("Private Room"));
    }

    #[tokio::test]
    async fn metadata_errors_degrade_to_absent() {
        let client = logged_in(Fake::default()).await;
        let meta = client.room_metadata("!broken:x.org").await.unwrap();
        assert_eq!(meta, RoomMetadata::default());
    }

    #[tokio::test]
    async fn send_text_posts_m_text() {
        let fake = Fake::default();
        let client = logged_in(fake.clone()).await;
        client.send_text("!log:x.org", "all good").await.unwrap();

        let sent = fake.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "!log:x.org");
        assert_eq!(sent[0].1, json!({ "msgtype": "m.text", "body": "all good" }));
    }
}
