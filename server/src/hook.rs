//! The hook: a projectile fired from the caster towards an aim point.
//!
//! A flight is advanced one tick at a time by timer callbacks. The flight
//! itself only carries what was fixed when it was fired (origin, angle,
//! candidate ids) plus how far it has travelled. Everything else is read
//! from the registry on every tick, so targets can dodge, disconnect or get
//! hooked by someone else while the hook is in the air.
//!
//! ```text
//! Flying --tick--> Flying
//!        --tip enters a live candidate box--> Hit --> target Respawning --delay--> Alive
//!        --length exhausted / match over--> Miss (caster only)
//! ```

use log::{debug, info};
use shared::{PlayerId, Position, ServerEvent};

use crate::arena::{Arena, Timer};
use crate::error::ArenaError;
use crate::room_manager::RoomKey;

#[derive(Debug, Clone, PartialEq)]
pub struct HookFlight {
    pub id: u64,
    pub caster: PlayerId,
    pub room: RoomKey,
    /// Caster position at fire time, frozen for the whole flight.
    pub origin: Position,
    pub angle: f32,
    pub traveled: f32,
    pub max_length: f32,
    /// Distance covered per tick.
    pub step: f32,
    /// Members that were hookable at fire time, in room order.
    pub candidates: Vec<PlayerId>,
}

impl HookFlight {
    pub fn tip(&self) -> Position {
        self.origin.project(self.angle, self.traveled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TickOutcome {
    Flying,
    Hit(PlayerId),
    Miss,
    /// The room or the caster is gone; nobody is left to tell.
    Abort,
}

impl Arena {
    pub(crate) fn hook_fired(&mut self, caster: PlayerId, aim: Position) -> Result<(), ArenaError> {
        let player = self.acting_player(caster)?;
        if player.active_hook.is_some() {
            return Err(ArenaError::InvalidState("hook already in flight"));
        }
        let origin = player
            .position
            .ok_or(ArenaError::InvalidState("caster has no position"))?;
        let room = self
            .rooms
            .get(&player.room_code)
            .ok_or(ArenaError::RoomNotFound)?;
        let room_key = room.key();

        let candidates: Vec<PlayerId> = room
            .members
            .iter()
            .copied()
            .filter(|id| *id != caster)
            .filter(|id| self.players.get(*id).is_some_and(|p| !p.is_respawning))
            .collect();

        let flight = HookFlight {
            id: self.next_flight_id(),
            caster,
            room: room_key,
            origin,
            angle: origin.angle_to(aim),
            traveled: 0.0,
            max_length: self.config.hook_max_length,
            step: self.config.hook_step(),
            candidates,
        };
        if let Some(player) = self.players.get_mut(caster) {
            player.active_hook = Some(flight.id);
        }
        debug!(
            "Hook {} fired by {} from ({:.1}, {:.1}) at {:.3} rad, {} candidates",
            flight.id,
            caster,
            origin.x,
            origin.y,
            flight.angle,
            flight.candidates.len()
        );

        self.broadcast_room(
            &flight.room.code,
            ServerEvent::HookStarted {
                player_id: caster,
                start_x: origin.x,
                start_y: origin.y,
                hook_angle: flight.angle,
                hook_length: flight.max_length,
                hook_speed: self.config.hook_speed,
            },
        );
        let tick = self.config.hook_tick;
        self.schedule(tick, Timer::HookTick(flight));
        Ok(())
    }

    pub(crate) fn hook_tick(&mut self, mut flight: HookFlight) {
        match self.advance_flight(&mut flight) {
            TickOutcome::Flying => {
                let tick = self.config.hook_tick;
                self.schedule(tick, Timer::HookTick(flight));
            }
            TickOutcome::Hit(target) => {
                self.release_hook(&flight);
                self.resolve_hit(&flight, target);
            }
            TickOutcome::Miss => {
                self.release_hook(&flight);
                debug!("Hook {} by {} missed", flight.id, flight.caster);
                self.send_to(flight.caster, ServerEvent::HookMiss);
            }
            TickOutcome::Abort => {
                self.release_hook(&flight);
                debug!("Hook {} abandoned", flight.id);
            }
        }
    }

    fn advance_flight(&self, flight: &mut HookFlight) -> TickOutcome {
        let Some(room) = self.rooms.get_by_key(&flight.room) else {
            return TickOutcome::Abort;
        };
        if !room.contains(flight.caster) || !self.players.contains(flight.caster) {
            return TickOutcome::Abort;
        }
        if room.game_over {
            return TickOutcome::Miss;
        }

        let previous_tip = flight.tip();
        flight.traveled += flight.step;
        if flight.traveled > flight.max_length {
            return TickOutcome::Miss;
        }
        let tip = flight.tip();

        let player_size = self.config.player_size;
        // Only a step longer than a box can jump over one; sweep in that case.
        let swept = flight.step > player_size;

        flight
            .candidates
            .iter()
            .copied()
            .find(|id| {
                let Some(target) = self.players.get(*id) else {
                    return false;
                };
                if target.is_respawning || !room.contains(*id) {
                    return false;
                }
                let Some(hitbox) = target.hitbox(player_size) else {
                    return false;
                };
                if swept {
                    hitbox.intersects_segment(previous_tip, tip)
                } else {
                    hitbox.contains(tip)
                }
            })
            .map_or(TickOutcome::Flying, TickOutcome::Hit)
    }

    fn release_hook(&mut self, flight: &HookFlight) {
        if let Some(caster) = self.players.get_mut(flight.caster) {
            if caster.active_hook == Some(flight.id) {
                caster.active_hook = None;
            }
        }
    }

    fn resolve_hit(&mut self, flight: &HookFlight, target: PlayerId) {
        let code = flight.room.code.clone();
        let Some(caster) = self.players.get_mut(flight.caster) else {
            return;
        };
        // Live position: the victim is dragged to where the caster is now.
        let pull_to = caster.position.unwrap_or(flight.origin);
        caster.score += 1;
        let score = caster.score;
        info!(
            "Hook {} by {} hit {}, score now {}",
            flight.id, flight.caster, target, score
        );

        self.broadcast_room(
            &code,
            ServerEvent::HookHit {
                by: flight.caster,
                target,
                pull_to,
            },
        );
        self.broadcast_room(
            &code,
            ServerEvent::ScoreUpdated {
                player_id: flight.caster,
                score,
            },
        );
        self.check_win(&flight.room, flight.caster);

        if let Some(victim) = self.players.get_mut(target) {
            victim.is_respawning = true;
        }
        self.broadcast_room(&code, ServerEvent::StartRespawnCountdown { target });
        let delay = self.config.respawn_delay;
        self.schedule(
            delay,
            Timer::Respawn {
                room: flight.room.clone(),
                target,
            },
        );
    }

    pub(crate) fn respawn_due(&mut self, room: &RoomKey, target: PlayerId) {
        let in_room = self
            .rooms
            .get_by_key(room)
            .is_some_and(|r| r.contains(target));
        if !in_room {
            debug!("Respawn for {} skipped, room {} is gone", target, room.code);
            return;
        }
        let player_size = self.config.player_size;
        let Some(area) = self
            .players
            .get(target)
            .and_then(|p| p.movement_area(player_size))
        else {
            debug!("Respawn for {} skipped, player is gone", target);
            return;
        };

        let spawn = self.random_point_in(area);
        if let Some(player) = self.players.get_mut(target) {
            player.position = Some(spawn);
            player.is_respawning = false;
        }
        info!("Player {} respawned at ({:.1}, {:.1})", target, spawn.x, spawn.y);
        self.broadcast_room(
            &room.code,
            ServerEvent::Respawn {
                x: spawn.x,
                y: spawn.y,
                target,
            },
        );
    }
}
