use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::geometry::{Position, Rect};
use crate::{PlayerId, MAX_ROOM_CODE_LEN};

/// One datagram on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    Connect { client_version: u32 },
    Heartbeat,
    Disconnect,

    Connected { client_id: PlayerId },
    Disconnected { reason: String },

    Client(ClientEvent),
    Server(ServerEvent),
}

/// Gameplay and lobby requests sent by a client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum ClientEvent {
    CreateRoom {
        room_code: String,
        name: Option<String>,
    },
    JoinRoom {
        room_code: String,
        name: Option<String>,
    },
    PlayerMove {
        id: PlayerId,
        x: f32,
        y: f32,
    },
    HookFired {
        player_id: PlayerId,
        target_x: f32,
        target_y: f32,
    },
    BlinkFired {
        player_id: PlayerId,
        new_x: f32,
        new_y: f32,
    },
    ShiftFired {
        player_id: PlayerId,
    },
    ShiftEnd {
        player_id: PlayerId,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("room code must be between 1 and {} characters", MAX_ROOM_CODE_LEN)]
    InvalidRoomCode,
    #[error("non-finite coordinate in {0}")]
    NonFiniteCoordinate(&'static str),
    #[error("payload id {claimed} does not match connection {sender}")]
    IdMismatch { claimed: PlayerId, sender: PlayerId },
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::CreateRoom { .. } => "createRoom",
            ClientEvent::JoinRoom { .. } => "joinRoom",
            ClientEvent::PlayerMove { .. } => "playerMove",
            ClientEvent::HookFired { .. } => "hookFired",
            ClientEvent::BlinkFired { .. } => "blinkFired",
            ClientEvent::ShiftFired { .. } => "shiftFired",
            ClientEvent::ShiftEnd { .. } => "shiftEnd",
        }
    }

    /// Checks the payload before it reaches any game logic.
    ///
    /// The connection that delivered the event is the only identity the
    /// server trusts, so a payload naming another player is rejected.
    pub fn validate(&self, sender: PlayerId) -> Result<(), ProtocolError> {
        let name = self.name();
        let check_id = |claimed: PlayerId| {
            if claimed == sender {
                Ok(())
            } else {
                Err(ProtocolError::IdMismatch { claimed, sender })
            }
        };
        let check_point = |x: f32, y: f32| {
            if x.is_finite() && y.is_finite() {
                Ok(())
            } else {
                Err(ProtocolError::NonFiniteCoordinate(name))
            }
        };

        match self {
            ClientEvent::CreateRoom { room_code, .. } | ClientEvent::JoinRoom { room_code, .. } => {
                let len = room_code.trim().chars().count();
                if len == 0 || len > MAX_ROOM_CODE_LEN {
                    return Err(ProtocolError::InvalidRoomCode);
                }
                Ok(())
            }
            ClientEvent::PlayerMove { id, x, y } => {
                check_id(*id)?;
                check_point(*x, *y)
            }
            ClientEvent::HookFired {
                player_id,
                target_x,
                target_y,
            } => {
                check_id(*player_id)?;
                check_point(*target_x, *target_y)
            }
            ClientEvent::BlinkFired {
                player_id,
                new_x,
                new_y,
            } => {
                check_id(*player_id)?;
                check_point(*new_x, *new_y)
            }
            ClientEvent::ShiftFired { player_id } | ClientEvent::ShiftEnd { player_id } => {
                check_id(*player_id)
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
}

/// Notifications pushed by the server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum ServerEvent {
    RoomCreated {
        room_code: String,
    },
    RoomError {
        message: String,
    },
    UpdatePlayerList {
        players: Vec<PlayerSummary>,
    },
    StartGame {
        players: Vec<PlayerId>,
        positions: HashMap<PlayerId, Position>,
        bounds: HashMap<PlayerId, Rect>,
    },
    PlayerMove {
        id: PlayerId,
        x: f32,
        y: f32,
    },
    HookStarted {
        player_id: PlayerId,
        start_x: f32,
        start_y: f32,
        hook_angle: f32,
        hook_length: f32,
        hook_speed: f32,
    },
    HookHit {
        by: PlayerId,
        target: PlayerId,
        pull_to: Position,
    },
    HookMiss,
    StartRespawnCountdown {
        target: PlayerId,
    },
    Respawn {
        x: f32,
        y: f32,
        target: PlayerId,
    },
    ScoreUpdated {
        player_id: PlayerId,
        score: u32,
    },
    GameOver {
        winner_id: PlayerId,
        winner_name: String,
    },
    GameReset,
    OpponentDisconnected {
        message: String,
    },
    BlinkEffect {
        player_id: PlayerId,
        new_x: f32,
        new_y: f32,
    },
    ShiftEffect {
        player_id: PlayerId,
    },
    ShiftEndEffect {
        player_id: PlayerId,
    },
}
