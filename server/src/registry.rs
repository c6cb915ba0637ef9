//! Authoritative per-player state.
//!
//! An entry exists from the moment a connection creates or joins a room
//! until it leaves, disconnects, or the room is reset after a match.

use log::debug;
use shared::{PlayerId, PlayerSummary, Position, Rect};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    /// Last authoritative center coordinate. Assigned at match start.
    pub position: Option<Position>,
    /// Region of the arena this player may occupy. Assigned at match start.
    pub bounds: Option<Rect>,
    /// Set from the moment the player is hooked until the respawn fires.
    pub is_respawning: bool,
    /// Flight id of this player's hook while it is in the air.
    pub active_hook: Option<u64>,
    /// Room this player belongs to; routing only.
    pub room_code: String,
}

impl Player {
    pub fn new(id: PlayerId, name: String, room_code: String) -> Self {
        Self {
            id,
            name,
            score: 0,
            position: None,
            bounds: None,
            is_respawning: false,
            active_hook: None,
            room_code,
        }
    }

    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }

    /// Range of legal center coordinates: the bounds shrunk by half a box
    /// so the whole player stays inside.
    pub fn movement_area(&self, player_size: f32) -> Option<Rect> {
        self.bounds.map(|bounds| bounds.inset(player_size / 2.0))
    }

    /// The player's current box, centered on the live position.
    pub fn hitbox(&self, player_size: f32) -> Option<Rect> {
        self.position
            .map(|center| Rect::centered(center, player_size, player_size))
    }
}

/// Players indexed by connection id.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<PlayerId, Player>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, player: Player) {
        debug!("Registered player {} ({})", player.id, player.name);
        self.players.insert(player.id, player);
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<Player> {
        self.players.remove(&id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation() {
        let player = Player::new(1, "ada".to_string(), "ROOM".to_string());
        assert_eq!(player.score, 0);
        assert!(!player.is_respawning);
        assert!(player.position.is_none());
        assert!(player.bounds.is_none());
        assert!(player.active_hook.is_none());
        assert_eq!(
            player.summary(),
            PlayerSummary {
                id: 1,
                name: "ada".to_string()
            }
        );
    }

    #[test]
    fn test_movement_area_and_hitbox() {
        let mut player = Player::new(1, "ada".to_string(), "ROOM".to_string());
        assert!(player.movement_area(32.0).is_none());
        assert!(player.hitbox(32.0).is_none());

        player.bounds = Some(Rect::new(0.0, 0.0, 1024.0, 300.0));
        player.position = Some(Position::new(100.0, 100.0));

        assert_eq!(
            player.movement_area(32.0),
            Some(Rect::new(16.0, 16.0, 1008.0, 284.0))
        );
        assert_eq!(
            player.hitbox(32.0),
            Some(Rect::new(84.0, 84.0, 116.0, 116.0))
        );
    }

    #[test]
    fn test_registry_insert_remove() {
        let mut registry = PlayerRegistry::new();
        assert!(registry.is_empty());

        registry.insert(Player::new(1, "ada".to_string(), "A".to_string()));
        registry.insert(Player::new(2, "bob".to_string(), "A".to_string()));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(1));

        registry.get_mut(1).unwrap().score = 3;
        assert_eq!(registry.get(1).unwrap().score, 3);

        assert!(registry.remove(1).is_some());
        assert!(registry.remove(1).is_none());
        assert_eq!(registry.len(), 1);
    }
}
