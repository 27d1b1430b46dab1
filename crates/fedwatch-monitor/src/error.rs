//! Sweep errors. Both are recovered by the scheduler.

use fedwatch_matrix::MatrixError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    /// The whole cycle is abandoned and retried later.
    #[error("Failed to list joined rooms: {0}")]
    RoomList(#[source] MatrixError),

    /// Only this room is skipped.
    #[error("Failed to list members of {room_id}: {source}")]
    Members {
        room_id: String,
        #[source]
        source: MatrixError,
    },
}
