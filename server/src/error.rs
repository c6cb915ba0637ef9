use shared::PlayerId;
use thiserror::Error;

/// Why an action was not applied.
///
/// None of these are fatal. The arena turns them into a notice for the
/// caller (`roomError`, `hookMiss`) or drops the action.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArenaError {
    #[error("Room does not exist.")]
    RoomNotFound,
    #[error("Room with this code already exists.")]
    RoomExists,
    #[error("Room is full.")]
    RoomFull,
    #[error("{0}")]
    InvalidState(&'static str),
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("room capacity must be between 2 and 4, got {0}")]
    RoomCapacity(usize),
    #[error("win score must be at least 1")]
    WinScore,
    #[error("hook length and speed must be positive")]
    HookParameters,
    #[error("hook tick, respawn delay and reset delay must be non-zero")]
    ZeroDuration,
    #[error("arena is too small to hold a player in every partition")]
    ArenaTooSmall,
}
