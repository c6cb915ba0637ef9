//! End of a match: the win check after every score change and the delayed
//! reset that tears the room down.

use log::{debug, info};
use shared::{PlayerId, ServerEvent};

use crate::arena::{Arena, Timer};
use crate::room_manager::RoomKey;

impl Arena {
    /// Latches `game_over` the first time `scorer` reaches the win score.
    pub(crate) fn check_win(&mut self, room: &RoomKey, scorer: PlayerId) {
        let win_score = self.config.win_score;
        let Some((score, winner_name)) = self
            .players
            .get(scorer)
            .map(|p| (p.score, p.name.clone()))
        else {
            return;
        };
        if score < win_score {
            return;
        }
        let Some(state) = self.rooms.get_by_key_mut(room) else {
            return;
        };
        if state.game_over {
            return;
        }
        state.game_over = true;

        info!(
            "Player {} ({}) wins room {} with {} points",
            scorer, winner_name, room.code, score
        );
        self.broadcast_room(
            &room.code,
            ServerEvent::GameOver {
                winner_id: scorer,
                winner_name,
            },
        );
        let delay = self.config.reset_delay;
        self.schedule(delay, Timer::Reset { room: room.clone() });
    }

    /// Announces the reset, then deletes the room and all of its players.
    pub(crate) fn reset_due(&mut self, room: &RoomKey) {
        if self.rooms.get_by_key(room).is_none() {
            debug!("Reset for room {} skipped, already gone", room.code);
            return;
        }
        self.broadcast_room(&room.code, ServerEvent::GameReset);
        self.dissolve_room(&room.code);
        info!("Room {} reset", room.code);
    }
}
