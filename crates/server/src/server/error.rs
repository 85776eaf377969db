//! Room request rejections.

use thiserror::Error;

/// Why a create/join request was refused. Sent back as an `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Room is full")]
    RoomFull,

    #[error("Game already in progress")]
    GameInProgress,
}
