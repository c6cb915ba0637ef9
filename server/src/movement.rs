//! Position claims from clients and the cosmetic abilities.
//!
//! Clients move themselves locally and report where they are. The server
//! does not simulate walking; it only pulls every claim back inside the
//! player's region before accepting it, which is the whole of its defence
//! against out-of-bounds or teleport claims.

use log::debug;
use shared::{PlayerId, Position, ServerEvent};

use crate::arena::Arena;
use crate::error::ArenaError;

impl Arena {
    /// Clamps `claimed` into the player's movement area and stores it.
    fn accept_position(&mut self, id: PlayerId, claimed: Position) -> Result<(String, Position), ArenaError> {
        let player_size = self.config.player_size;
        let player = self.acting_player(id)?;
        let area = player
            .movement_area(player_size)
            .ok_or(ArenaError::InvalidState("player has no bounds yet"))?;
        let code = player.room_code.clone();

        let clamped = area.clamp(claimed);
        if let Some(player) = self.players.get_mut(id) {
            player.position = Some(clamped);
        }
        Ok((code, clamped))
    }

    pub(crate) fn player_move(&mut self, id: PlayerId, claimed: Position) -> Result<(), ArenaError> {
        let (code, position) = self.accept_position(id, claimed)?;
        self.broadcast_room_except(
            &code,
            id,
            ServerEvent::PlayerMove {
                id,
                x: position.x,
                y: position.y,
            },
        );
        Ok(())
    }

    pub(crate) fn blink_fired(&mut self, id: PlayerId, destination: Position) -> Result<(), ArenaError> {
        let (code, position) = self.accept_position(id, destination)?;
        debug!("Player {} blinked to ({:.1}, {:.1})", id, position.x, position.y);
        self.broadcast_room(
            &code,
            ServerEvent::BlinkEffect {
                player_id: id,
                new_x: position.x,
                new_y: position.y,
            },
        );
        Ok(())
    }

    /// Shift duration is owned by the client; the server only gates it.
    pub(crate) fn shift_fired(&mut self, id: PlayerId) -> Result<(), ArenaError> {
        let code = self.acting_player(id)?.room_code.clone();
        self.broadcast_room(&code, ServerEvent::ShiftEffect { player_id: id });
        Ok(())
    }

    pub(crate) fn shift_end(&mut self, id: PlayerId) -> Result<(), ArenaError> {
        let code = self.acting_player(id)?.room_code.clone();
        self.broadcast_room(&code, ServerEvent::ShiftEndEffect { player_id: id });
        Ok(())
    }
}
