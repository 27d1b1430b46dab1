//! # fedwatch-matrix
//!
//! The messaging side of fedwatch: everything the monitor needs from its own
//! homeserver, behind the [`Homeserver`] trait.
//!
//! [`MatrixClient`] implements it over the client-server API: password login,
//! `joined_rooms`, room alias/name state, `joined_members`, and plain-text
//! `m.room.message` sends.

pub mod client;
pub mod error;
pub mod homeserver;
pub mod types;

pub use client::MatrixClient;
pub use error::{MatrixError, Result};
pub use homeserver::Homeserver;
pub use types::RoomMetadata;
