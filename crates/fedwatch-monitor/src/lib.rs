//! # fedwatch-monitor
//!
//! Drives the federation checks for every room the monitoring account is in.
//!
//! ```text
//!  Scheduler ──(every interval)──► RoomSweeper::sweep_room(room)
//!                                     │  members → domains (deduplicated)
//!                                     │  resolve → probe   (bounded fan-out)
//!                                     └─► one report message to the log room
//! ```
//!
//! - **Sweep** (`sweep.rs`): one room, one report.
//! - **Scheduler** (`scheduler.rs`): the endless loop, shutdown handling, and
//!   retry of failed room listings.
//! - **Retry** (`retry.rs`): fixed or exponential delay policy.

pub mod error;
pub mod report;
pub mod retry;
pub mod scheduler;
pub mod sweep;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::SweepError;
pub use report::{DomainStatus, RoomSnapshot, SweepReport};
pub use retry::RetryPolicy;
pub use scheduler::{CycleSummary, Scheduler};
pub use sweep::RoomSweeper;
