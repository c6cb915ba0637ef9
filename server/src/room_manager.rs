//! Room lifecycle: create, join, leave, and the start of a match.
//!
//! A room exists while it has members. It is dropped synchronously as soon
//! as the last member leaves, when a started match loses all but one member,
//! or when the delayed reset after a win fires.

use log::{debug, info};
use shared::{sanitize_name, PlayerId, PlayerSummary, Rect, ServerEvent};
use std::collections::HashMap;

use crate::arena::Arena;
use crate::error::ArenaError;
use crate::registry::Player;

const OPPONENT_DISCONNECTED: &str = "Your opponent has disconnected. Game ended.";

/// Identifies one incarnation of a room. Codes are reused after a room is
/// deleted, instances never are.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomKey {
    pub code: String,
    pub instance: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub code: String,
    pub instance: u64,
    /// Join order. Also the tie-break order for simultaneous hook hits.
    pub members: Vec<PlayerId>,
    pub capacity: usize,
    pub started: bool,
    /// Latched once the match is decided; every gameplay action is refused after.
    pub game_over: bool,
}

impl Room {
    fn new(code: String, instance: u64, capacity: usize) -> Self {
        Self {
            code,
            instance,
            members: Vec::with_capacity(capacity),
            capacity,
            started: false,
            game_over: false,
        }
    }

    pub fn key(&self) -> RoomKey {
        RoomKey {
            code: self.code.clone(),
            instance: self.instance,
        }
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.members.contains(&id)
    }
}

/// Rooms indexed by code.
#[derive(Debug, Default)]
pub struct RoomTable {
    rooms: HashMap<String, Room>,
    next_instance: u64,
}

impl RoomTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, code: String, capacity: usize) -> &mut Room {
        self.next_instance += 1;
        let room = Room::new(code.clone(), self.next_instance, capacity);
        self.rooms.entry(code).or_insert(room)
    }

    pub fn get(&self, code: &str) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// The room only if it is still the incarnation `key` refers to.
    pub fn get_by_key(&self, key: &RoomKey) -> Option<&Room> {
        self.rooms
            .get(&key.code)
            .filter(|room| room.instance == key.instance)
    }

    pub fn get_by_key_mut(&mut self, key: &RoomKey) -> Option<&mut Room> {
        self.rooms
            .get_mut(&key.code)
            .filter(|room| room.instance == key.instance)
    }

    pub fn remove(&mut self, code: &str) -> Option<Room> {
        self.rooms.remove(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rooms.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// Splits the arena into one region per player.
///
/// Two or three players get horizontal bands (two means top and bottom
/// halves), four get quadrants. Regions are returned in member order.
pub fn partition_arena(width: f32, height: f32, players: usize) -> Vec<Rect> {
    if players == 4 {
        let (mid_x, mid_y) = (width / 2.0, height / 2.0);
        return vec![
            Rect::new(0.0, 0.0, mid_x, mid_y),
            Rect::new(mid_x, 0.0, width, mid_y),
            Rect::new(0.0, mid_y, mid_x, height),
            Rect::new(mid_x, mid_y, width, height),
        ];
    }

    let bands = players.max(1);
    let band_height = height / bands as f32;
    (0..bands)
        .map(|i| {
            let top = band_height * i as f32;
            let bottom = if i + 1 == bands { height } else { top + band_height };
            Rect::new(0.0, top, width, bottom)
        })
        .collect()
}

impl Arena {
    pub(crate) fn create_room(
        &mut self,
        caller: PlayerId,
        code: &str,
        name: Option<&str>,
    ) -> Result<(), ArenaError> {
        if self.rooms.contains(code) {
            info!("Room {} already exists, {} tried to create it", code, caller);
            return Err(ArenaError::RoomExists);
        }
        if self.players.contains(caller) {
            self.leave(caller);
        }

        let capacity = self.config.room_capacity;
        self.rooms.insert(code.to_string(), capacity).members.push(caller);
        self.players
            .insert(Player::new(caller, sanitize_name(name), code.to_string()));
        info!("Player {} created room {}", caller, code);

        self.send_to(
            caller,
            ServerEvent::RoomCreated {
                room_code: code.to_string(),
            },
        );
        self.broadcast_player_list(code);
        Ok(())
    }

    pub(crate) fn join_room(
        &mut self,
        caller: PlayerId,
        code: &str,
        name: Option<&str>,
    ) -> Result<(), ArenaError> {
        let room = self.rooms.get(code).ok_or(ArenaError::RoomNotFound)?;
        if room.is_full() {
            return Err(ArenaError::RoomFull);
        }
        if room.contains(caller) {
            debug!("Player {} already in room {}", caller, code);
            return Ok(());
        }
        if room.started {
            return Err(ArenaError::InvalidState("Game already in progress."));
        }

        if self.players.contains(caller) {
            self.leave(caller);
        }

        let Some(room) = self.rooms.get_mut(code) else {
            return Err(ArenaError::RoomNotFound);
        };
        room.members.push(caller);
        let full = room.is_full();
        self.players
            .insert(Player::new(caller, sanitize_name(name), code.to_string()));
        info!("Player {} joined room {}", caller, code);

        self.broadcast_player_list(code);
        if full {
            self.start_match(code);
        }
        Ok(())
    }

    /// Removes `id` from its room. Idempotent: a player already cleaned up
    /// by a reset or by an earlier disconnect is ignored.
    pub(crate) fn leave(&mut self, id: PlayerId) {
        let Some(player) = self.players.remove(id) else {
            debug!("Leave for unregistered player {}", id);
            return;
        };
        let code = player.room_code;
        let Some(room) = self.rooms.get_mut(&code) else {
            return;
        };
        room.members.retain(|member| *member != id);
        info!(
            "Player {} left room {}, {} remaining",
            id,
            code,
            room.members.len()
        );

        if room.members.is_empty() {
            self.rooms.remove(&code);
            info!("Room {} is empty and deleted", code);
            return;
        }
        if room.game_over {
            return;
        }
        if room.started && room.members.len() == 1 {
            room.game_over = true;
            let remaining = room.members[0];
            self.send_to(
                remaining,
                ServerEvent::OpponentDisconnected {
                    message: OPPONENT_DISCONNECTED.to_string(),
                },
            );
            self.dissolve_room(&code);
            info!("Opponent left room {}, notified {}, room deleted", code, remaining);
            return;
        }
        self.broadcast_player_list(&code);
    }

    /// Deletes the room and every member's player entry.
    pub(crate) fn dissolve_room(&mut self, code: &str) {
        if let Some(room) = self.rooms.remove(code) {
            for member in room.members {
                self.players.remove(member);
            }
        }
    }

    fn start_match(&mut self, code: &str) {
        let Some(room) = self.rooms.get_mut(code) else {
            return;
        };
        room.started = true;
        let members = room.members.clone();

        let regions = partition_arena(
            self.config.arena_width,
            self.config.arena_height,
            members.len(),
        );
        let half = self.config.half_size();
        let mut positions = HashMap::new();
        let mut bounds = HashMap::new();

        for (&id, region) in members.iter().zip(regions) {
            let spawn = self.random_point_in(region.inset(half));
            if let Some(player) = self.players.get_mut(id) {
                player.bounds = Some(region);
                player.position = Some(spawn);
            }
            info!(
                "Player {} spawns at ({:.1}, {:.1}) in [{:.0}, {:.0}]-[{:.0}, {:.0}]",
                id, spawn.x, spawn.y, region.left, region.top, region.right, region.bottom
            );
            positions.insert(id, spawn);
            bounds.insert(id, region);
        }

        info!("Starting match in room {} with {} players", code, members.len());
        self.broadcast_room(
            code,
            ServerEvent::StartGame {
                players: members,
                positions,
                bounds,
            },
        );
    }

    fn broadcast_player_list(&mut self, code: &str) {
        let Some(room) = self.rooms.get(code) else {
            return;
        };
        let players: Vec<PlayerSummary> = room
            .members
            .iter()
            .filter_map(|id| self.players.get(*id))
            .map(Player::summary)
            .collect();
        self.broadcast_room(code, ServerEvent::UpdatePlayerList { players });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::tests::{events_for, started_arena, test_arena};
    use crate::config::ArenaConfig;
    use shared::{ClientEvent, Position};

    fn create(arena: &mut Arena, id: PlayerId, code: &str) {
        arena.handle_event(
            id,
            ClientEvent::CreateRoom {
                room_code: code.to_string(),
                name: Some(format!("p{}", id)),
            },
        );
    }

    fn join(arena: &mut Arena, id: PlayerId, code: &str) {
        arena.handle_event(
            id,
            ClientEvent::JoinRoom {
                room_code: code.to_string(),
                name: Some(format!("p{}", id)),
            },
        );
    }

    #[test]
    fn test_partition_two_players_halves() {
        let regions = partition_arena(1024.0, 600.0, 2);
        assert_eq!(
            regions,
            vec![
                Rect::new(0.0, 0.0, 1024.0, 300.0),
                Rect::new(0.0, 300.0, 1024.0, 600.0)
            ]
        );
    }

    #[test]
    fn test_partition_three_and_four_players() {
        let bands = partition_arena(1024.0, 600.0, 3);
        assert_eq!(bands.len(), 3);
        assert_eq!(bands[0].bottom, bands[1].top);
        assert_eq!(bands[2].bottom, 600.0);

        let quadrants = partition_arena(1024.0, 600.0, 4);
        assert_eq!(quadrants.len(), 4);
        assert_eq!(quadrants[3], Rect::new(512.0, 300.0, 1024.0, 600.0));
    }

    #[test]
    fn test_create_room() {
        let mut arena = test_arena();
        create(&mut arena, 1, "ROOM");

        let room = arena.room("ROOM").unwrap();
        assert_eq!(room.members, vec![1]);
        assert!(!room.started);
        let player = arena.player(1).unwrap();
        assert_eq!(player.score, 0);
        assert!(!player.is_respawning);
        assert_eq!(player.name, "p1");

        let dispatches = arena.take_dispatches();
        let events = events_for(&dispatches, 1);
        assert_eq!(
            events[0],
            ServerEvent::RoomCreated {
                room_code: "ROOM".to_string()
            }
        );
        assert!(matches!(events[1], ServerEvent::UpdatePlayerList { .. }));
    }

    #[test]
    fn test_create_existing_room_fails_without_mutation() {
        let mut arena = test_arena();
        create(&mut arena, 1, "ROOM");
        arena.take_dispatches();

        create(&mut arena, 2, "ROOM");

        assert_eq!(arena.room("ROOM").unwrap().members, vec![1]);
        assert!(arena.player(2).is_none());
        assert_eq!(
            arena.take_dispatches(),
            vec![crate::arena::Dispatch {
                recipients: vec![2],
                event: ServerEvent::RoomError {
                    message: "Room with this code already exists.".to_string()
                }
            }]
        );
    }

    #[test]
    fn test_join_missing_room() {
        let mut arena = test_arena();
        join(&mut arena, 1, "NOPE");
        let events = events_for(&arena.take_dispatches(), 1);
        assert_eq!(
            events,
            vec![ServerEvent::RoomError {
                message: "Room does not exist.".to_string()
            }]
        );
        assert_eq!(arena.player_count(), 0);
    }

    #[test]
    fn test_join_full_room_fails_without_mutation() {
        let mut arena = started_arena("ROOM");
        join(&mut arena, 3, "ROOM");

        assert_eq!(arena.room("ROOM").unwrap().members, vec![1, 2]);
        assert!(arena.player(3).is_none());
        let events = events_for(&arena.take_dispatches(), 3);
        assert_eq!(
            events,
            vec![ServerEvent::RoomError {
                message: "Room is full.".to_string()
            }]
        );
    }

    #[test]
    fn test_member_rejoining_full_room_gets_room_full() {
        let mut arena = started_arena("ROOM");
        join(&mut arena, 1, "ROOM");

        assert_eq!(arena.room("ROOM").unwrap().members, vec![1, 2]);
        assert_eq!(
            arena.take_dispatches(),
            vec![crate::arena::Dispatch {
                recipients: vec![1],
                event: ServerEvent::RoomError {
                    message: "Room is full.".to_string()
                }
            }]
        );
        assert!(arena.room("ROOM").unwrap().started);
    }

    #[test]
    fn test_join_twice_is_noop() {
        let mut arena = test_arena();
        arena.config.room_capacity = 3;
        create(&mut arena, 1, "ROOM");
        join(&mut arena, 2, "ROOM");
        arena.take_dispatches();

        join(&mut arena, 2, "ROOM");
        assert_eq!(arena.room("ROOM").unwrap().members, vec![1, 2]);
        assert!(arena.take_dispatches().is_empty());
    }

    #[test]
    fn test_match_start_assigns_bounds_and_spawns() {
        let mut arena = test_arena();
        create(&mut arena, 1, "ROOM");
        join(&mut arena, 2, "ROOM");

        assert!(arena.room("ROOM").unwrap().started);
        let top = arena.player(1).unwrap();
        let bottom = arena.player(2).unwrap();
        assert_eq!(top.bounds, Some(Rect::new(0.0, 0.0, 1024.0, 300.0)));
        assert_eq!(bottom.bounds, Some(Rect::new(0.0, 300.0, 1024.0, 600.0)));

        let top_area = top.movement_area(32.0).unwrap();
        let bottom_area = bottom.movement_area(32.0).unwrap();
        assert!(top_area.contains(top.position.unwrap()));
        assert!(bottom_area.contains(bottom.position.unwrap()));

        let dispatches = arena.take_dispatches();
        let start = dispatches
            .iter()
            .find(|d| matches!(d.event, ServerEvent::StartGame { .. }))
            .expect("start event");
        assert_eq!(start.recipients, vec![1, 2]);
        match &start.event {
            ServerEvent::StartGame {
                players, positions, ..
            } => {
                assert_eq!(players, &vec![1, 2]);
                assert_eq!(positions.get(&1).copied(), arena.player(1).unwrap().position);
                assert_eq!(positions.get(&2).copied(), arena.player(2).unwrap().position);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_spawns_respect_bounds_across_seeds() {
        for seed in 0..50 {
            let mut arena = Arena::new(ArenaConfig {
                rng_seed: Some(seed),
                ..ArenaConfig::default()
            });
            create(&mut arena, 1, "ROOM");
            join(&mut arena, 2, "ROOM");
            for id in [1, 2] {
                let player = arena.player(id).unwrap();
                let hitbox = player.hitbox(32.0).unwrap();
                let bounds = player.bounds.unwrap();
                assert!(bounds.contains(Position::new(hitbox.left, hitbox.top)));
                assert!(bounds.contains(Position::new(hitbox.right, hitbox.bottom)));
            }
        }
    }

    #[test]
    fn test_four_player_room_waits_until_full() {
        let mut arena = Arena::new(ArenaConfig {
            room_capacity: 4,
            rng_seed: Some(1),
            ..ArenaConfig::default()
        });
        create(&mut arena, 1, "QUAD");
        join(&mut arena, 2, "QUAD");
        join(&mut arena, 3, "QUAD");
        assert!(!arena.room("QUAD").unwrap().started);

        join(&mut arena, 4, "QUAD");
        assert!(arena.room("QUAD").unwrap().started);
        assert_eq!(
            arena.player(4).unwrap().bounds,
            Some(Rect::new(512.0, 300.0, 1024.0, 600.0))
        );
    }

    #[test]
    fn test_join_started_room_is_refused() {
        let mut arena = Arena::new(ArenaConfig {
            room_capacity: 3,
            rng_seed: Some(1),
            ..ArenaConfig::default()
        });
        create(&mut arena, 1, "TRIO");
        join(&mut arena, 2, "TRIO");
        join(&mut arena, 3, "TRIO");
        arena.handle_disconnect(3);
        arena.take_dispatches();

        join(&mut arena, 4, "TRIO");
        let events = events_for(&arena.take_dispatches(), 4);
        assert_eq!(
            events,
            vec![ServerEvent::RoomError {
                message: "Game already in progress.".to_string()
            }]
        );
    }

    #[test]
    fn test_switching_rooms_leaves_previous() {
        let mut arena = test_arena();
        create(&mut arena, 1, "A");
        create(&mut arena, 1, "B");

        assert!(arena.room("A").is_none());
        assert_eq!(arena.room("B").unwrap().members, vec![1]);
        assert_eq!(arena.player(1).unwrap().room_code, "B");
    }

    #[test]
    fn test_disconnect_notifies_remaining_player() {
        let mut arena = started_arena("ROOM");
        arena.handle_disconnect(1);

        assert!(arena.room("ROOM").is_none());
        assert_eq!(arena.player_count(), 0);
        let dispatches = arena.take_dispatches();
        assert_eq!(
            dispatches,
            vec![crate::arena::Dispatch {
                recipients: vec![2],
                event: ServerEvent::OpponentDisconnected {
                    message: OPPONENT_DISCONNECTED.to_string()
                }
            }]
        );

        // The remaining player's own disconnect finds nothing left to clean.
        arena.handle_disconnect(2);
        assert!(arena.take_dispatches().is_empty());
    }

    #[test]
    fn test_simultaneous_disconnects_send_nothing() {
        let mut arena = started_arena("ROOM");
        arena.handle_disconnects(&[1, 2]);

        assert!(arena.room("ROOM").is_none());
        assert!(arena.player(1).is_none());
        assert!(arena.player(2).is_none());
        assert!(arena.take_dispatches().is_empty());
    }

    #[test]
    fn test_last_member_leaving_deletes_room() {
        let mut arena = test_arena();
        create(&mut arena, 1, "ROOM");
        arena.take_dispatches();

        arena.handle_disconnect(1);
        assert!(arena.room("ROOM").is_none());
        assert!(arena.take_dispatches().is_empty());
    }

    #[test]
    fn test_lobby_leave_updates_list() {
        let mut arena = test_arena();
        arena.config.room_capacity = 3;
        create(&mut arena, 1, "ROOM");
        join(&mut arena, 2, "ROOM");
        arena.take_dispatches();

        arena.handle_disconnect(2);
        assert_eq!(arena.room("ROOM").unwrap().members, vec![1]);
        assert!(!arena.room("ROOM").unwrap().game_over);
        assert_eq!(
            events_for(&arena.take_dispatches(), 1),
            vec![ServerEvent::UpdatePlayerList {
                players: vec![PlayerSummary {
                    id: 1,
                    name: "p1".to_string()
                }]
            }]
        );
    }

    #[test]
    fn test_leave_after_game_over_prunes_silently() {
        let mut arena = started_arena("ROOM");
        arena.rooms.get_mut("ROOM").unwrap().game_over = true;

        arena.handle_disconnect(2);
        assert_eq!(arena.room("ROOM").unwrap().members, vec![1]);
        assert!(arena.player(2).is_none());
        assert!(arena.player(1).is_some());
        assert!(arena.take_dispatches().is_empty());
    }

    #[test]
    fn test_room_instances_are_unique() {
        let mut arena = test_arena();
        create(&mut arena, 1, "ROOM");
        let first = arena.room("ROOM").unwrap().key();
        arena.handle_disconnect(1);
        create(&mut arena, 1, "ROOM");
        let second = arena.room("ROOM").unwrap().key();

        assert_ne!(first, second);
        assert!(arena.rooms.get_by_key(&first).is_none());
        assert!(arena.rooms.get_by_key(&second).is_some());
    }
}
