//! Types and constants shared between the match server and its clients.
//!
//! Everything in here must stay in lock-step with the presentation layer:
//! the arena dimensions, the player box and the hook parameters are used by
//! both sides to simulate and to draw the same thing.

mod geometry;
mod protocol;

pub use geometry::{segments_intersect, Position, Rect};
pub use protocol::{ClientEvent, Packet, PlayerSummary, ProtocolError, ServerEvent};

/// Connection identity assigned by the server. Doubles as the player id.
pub type PlayerId = u32;

pub const PROTOCOL_VERSION: u32 = 1;

pub const ARENA_WIDTH: f32 = 1024.0;
pub const ARENA_HEIGHT: f32 = 600.0;
pub const PLAYER_SIZE: f32 = 32.0;

pub const HOOK_MAX_LENGTH: f32 = 350.0;
/// Units per second.
pub const HOOK_SPEED: f32 = 750.0;
pub const HOOK_TICK_MS: u64 = 25;

pub const RESPAWN_DELAY_MS: u64 = 3000;
pub const RESET_DELAY_MS: u64 = 5000;
pub const WIN_SCORE: u32 = 5;

pub const DEFAULT_ROOM_CAPACITY: usize = 2;
pub const MAX_ROOM_CAPACITY: usize = 4;

pub const MAX_NAME_LEN: usize = 10;
pub const DEFAULT_PLAYER_NAME: &str = "Anonymous";
pub const MAX_ROOM_CODE_LEN: usize = 16;

/// Normalises a user supplied display name.
pub fn sanitize_name(name: Option<&str>) -> String {
    let trimmed = name.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return DEFAULT_PLAYER_NAME.to_string();
    }
    trimmed.chars().take(MAX_NAME_LEN).collect()
}
