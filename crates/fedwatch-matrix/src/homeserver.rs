//! The operations the monitor consumes from its homeserver.

use async_trait::async_trait;

use crate::{error::Result, types::RoomMetadata};

/// Room listing and messaging, as seen from the monitoring account.
#[async_trait]
pub trait Homeserver: Send + Sync {
    /// Room IDs the account is currently joined to.
    async fn joined_rooms(&self) -> Result<Vec<String>>;

    /// Canonical alias and display name. Either half may be missing.
    async fn room_metadata(&self, room_id: &str) -> Result<RoomMetadata>;

    /// User IDs of the room's joined members.
    async fn joined_members(&self, room_id: &str) -> Result<Vec<String>>;

    /// Post a plain-text message.
    async fn send_text(&self, room_id: &str, text: &str) -> Result<()>;
}
