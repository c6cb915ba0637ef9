//! The match service: one instance owns every room and player it serves.
//!
//! Handlers run to completion against `&mut Arena` and never block. They
//! describe their side effects instead of performing them:
//!
//! - outgoing events are queued as [`Dispatch`]es with their recipients
//!   already resolved to connection ids,
//! - anything that must happen later is queued as a [`Scheduled`] timer.
//!
//! The network layer drains both queues after every call, delivers the
//! dispatches and feeds each timer back through [`Arena::handle_timer`] once
//! its delay elapses. Between two timer callbacks any other event may run,
//! which is what lets a target dodge a hook that is already in the air.

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{ClientEvent, PlayerId, Position, Rect, ServerEvent};
use std::collections::HashSet;
use std::time::Duration;

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::hook::HookFlight;
use crate::registry::{Player, PlayerRegistry};
use crate::room_manager::{Room, RoomKey, RoomTable};

/// An event and the connections that should receive it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub recipients: Vec<PlayerId>,
    pub event: ServerEvent,
}

/// Deferred work. Each variant carries the room instance it was created
/// for, so a timer that outlives its room does nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Timer {
    HookTick(HookFlight),
    Respawn { room: RoomKey, target: PlayerId },
    Reset { room: RoomKey },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scheduled {
    pub delay: Duration,
    pub timer: Timer,
}

pub struct Arena {
    pub(crate) config: ArenaConfig,
    pub(crate) players: PlayerRegistry,
    pub(crate) rooms: RoomTable,
    rng: StdRng,
    next_flight_id: u64,
    /// Connections being torn down in the current batch; never addressed.
    departing: HashSet<PlayerId>,
    outbox: Vec<Dispatch>,
    timers: Vec<Scheduled>,
}

impl Arena {
    pub fn new(config: ArenaConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            players: PlayerRegistry::new(),
            rooms: RoomTable::new(),
            rng,
            next_flight_id: 1,
            departing: HashSet::new(),
            outbox: Vec::new(),
            timers: Vec::new(),
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Entry point for every validated-or-not client event.
    pub fn handle_event(&mut self, sender: PlayerId, event: ClientEvent) {
        let event_name = event.name();
        if let Err(e) = event.validate(sender) {
            warn!("Rejected {} from {}: {}", event_name, sender, e);
            if matches!(
                event,
                ClientEvent::CreateRoom { .. } | ClientEvent::JoinRoom { .. }
            ) {
                self.send_to(sender, ServerEvent::RoomError { message: e.to_string() });
            }
            return;
        }

        let result = match event {
            ClientEvent::CreateRoom { room_code, name } => {
                self.create_room(sender, room_code.trim(), name.as_deref())
            }
            ClientEvent::JoinRoom { room_code, name } => {
                self.join_room(sender, room_code.trim(), name.as_deref())
            }
            ClientEvent::PlayerMove { x, y, .. } => self.player_move(sender, Position::new(x, y)),
            ClientEvent::HookFired {
                target_x, target_y, ..
            } => self.hook_fired(sender, Position::new(target_x, target_y)),
            ClientEvent::BlinkFired { new_x, new_y, .. } => {
                self.blink_fired(sender, Position::new(new_x, new_y))
            }
            ClientEvent::ShiftFired { .. } => self.shift_fired(sender),
            ClientEvent::ShiftEnd { .. } => self.shift_end(sender),
        };

        if let Err(e) = result {
            debug!("Dropped {} from {}: {}", event_name, sender, e);
            match event_name {
                "createRoom" | "joinRoom" => {
                    self.send_to(sender, ServerEvent::RoomError { message: e.to_string() })
                }
                "hookFired" => self.send_to(sender, ServerEvent::HookMiss),
                _ => {}
            }
        }
    }

    /// A connection went away. Safe to call for ids that were never, or are
    /// no longer, registered.
    pub fn handle_disconnect(&mut self, id: PlayerId) {
        self.handle_disconnects(&[id]);
    }

    /// Several connections went away at once. None of them is addressed
    /// while the others are cleaned up.
    pub fn handle_disconnects(&mut self, ids: &[PlayerId]) {
        self.departing.extend(ids.iter().copied());
        for &id in ids {
            self.leave(id);
        }
        self.departing.clear();
    }

    pub fn handle_timer(&mut self, timer: Timer) {
        match timer {
            Timer::HookTick(flight) => self.hook_tick(flight),
            Timer::Respawn { room, target } => self.respawn_due(&room, target),
            Timer::Reset { room } => self.reset_due(&room),
        }
    }

    pub fn take_dispatches(&mut self) -> Vec<Dispatch> {
        std::mem::take(&mut self.outbox)
    }

    pub fn take_timers(&mut self) -> Vec<Scheduled> {
        std::mem::take(&mut self.timers)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn room(&self, code: &str) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Looks up a player allowed to act right now: registered, in a live
    /// room whose match is not over, and not respawning.
    pub(crate) fn acting_player(&self, id: PlayerId) -> Result<&Player, ArenaError> {
        let player = self.players.get(id).ok_or(ArenaError::UnknownPlayer(id))?;
        let room = self
            .rooms
            .get(&player.room_code)
            .ok_or(ArenaError::RoomNotFound)?;
        if room.game_over {
            return Err(ArenaError::InvalidState("match is over"));
        }
        if player.is_respawning {
            return Err(ArenaError::InvalidState("player is respawning"));
        }
        Ok(player)
    }

    pub(crate) fn send_to(&mut self, id: PlayerId, event: ServerEvent) {
        self.push(vec![id], event);
    }

    pub(crate) fn broadcast_room(&mut self, code: &str, event: ServerEvent) {
        let recipients = self
            .rooms
            .get(code)
            .map(|room| room.members.clone())
            .unwrap_or_default();
        self.push(recipients, event);
    }

    pub(crate) fn broadcast_room_except(&mut self, code: &str, except: PlayerId, event: ServerEvent) {
        let recipients = self
            .rooms
            .get(code)
            .map(|room| {
                room.members
                    .iter()
                    .copied()
                    .filter(|id| *id != except)
                    .collect()
            })
            .unwrap_or_default();
        self.push(recipients, event);
    }

    fn push(&mut self, mut recipients: Vec<PlayerId>, event: ServerEvent) {
        recipients.retain(|id| !self.departing.contains(id));
        if recipients.is_empty() {
            return;
        }
        self.outbox.push(Dispatch { recipients, event });
    }

    pub(crate) fn schedule(&mut self, delay: Duration, timer: Timer) {
        self.timers.push(Scheduled { delay, timer });
    }

    pub(crate) fn next_flight_id(&mut self) -> u64 {
        let id = self.next_flight_id;
        self.next_flight_id += 1;
        id
    }

    /// Uniformly random point inside `area`, edges included.
    pub(crate) fn random_point_in(&mut self, area: Rect) -> Position {
        Position {
            x: self.rng.gen_range(area.left..=area.right),
            y: self.rng.gen_range(area.top..=area.bottom),
        }
    }
}
