//! # Hook Arena Match Server
//!
//! Authoritative server for a small real-time arena game. Players meet in
//! rooms identified by a short code, and once a room is full each of them is
//! confined to a region of the arena and tries to hook the others. A hook is
//! a projectile simulated here, on the server, tick by tick; the first
//! player to land the winning number of hooks takes the match.
//!
//! ## Core Responsibilities
//!
//! ### Room Lifecycle
//! Creating and joining rooms, starting the match when a room fills up,
//! and tearing the room down when a player leaves or the match has been won.
//!
//! ### Authoritative Positions
//! Clients move themselves and report where they are. Every claim is clamped
//! into the player's assigned region before it is stored or relayed, so no
//! client can leave its part of the arena.
//!
//! ### Hook Simulation and Scoring
//! Hooks advance on a fixed tick against live hitboxes. Hits award points,
//! put the target into a respawn countdown and may end the match.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! All game state lives in one [`arena::Arena`] owned by the network loop.
//! Network events and timer callbacks are processed strictly one at a time,
//! so handlers never observe a half-applied change. Handlers queue their
//! output instead of sending it; the loop drains the queues after each call.
//!
//! ### UDP-Based Communication
//! Clients talk to the server over UDP with bincode-encoded
//! [`shared::Packet`]s. A small handshake assigns each address a connection
//! id, which is also its player id. Silent clients are dropped after a
//! timeout and treated exactly like a disconnect.
//!
//! ## Module Organization
//!
//! - `arena`: the service instance, event dispatch and output queues
//! - `room_manager`: rooms, membership and match start
//! - `registry`: per-player state
//! - `movement`: position claims and the cosmetic abilities
//! - `hook`: hook flights, hits and respawns
//! - `lifecycle`: the win check and the post-match reset
//! - `client_manager`: connection roster for the UDP transport
//! - `network`: socket tasks and the main loop
//! - `config`, `error`: settings and error types
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::{ArenaConfig, ServerConfig};
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = ServerConfig {
//!         bind_addr: "0.0.0.0:3000".to_string(),
//!         ..ServerConfig::default()
//!     };
//!     let mut server = Server::new(&config, ArenaConfig::default()).await?;
//!     server.run().await
//! }
//! ```
//!
//! The arena can also be driven without any networking, which is how the
//! tests exercise it:
//!
//! ```rust
//! use server::arena::Arena;
//! use server::config::ArenaConfig;
//! use shared::{ClientEvent, ServerEvent};
//!
//! let mut arena = Arena::new(ArenaConfig::default());
//! arena.handle_event(1, ClientEvent::CreateRoom { room_code: "abc".into(), name: None });
//! let dispatches = arena.take_dispatches();
//! assert_eq!(dispatches[0].event, ServerEvent::RoomCreated { room_code: "abc".into() });
//! ```

pub mod arena;
pub mod client_manager;
pub mod config;
pub mod error;
pub mod hook;
pub mod lifecycle;
pub mod movement;
pub mod network;
pub mod registry;
pub mod room_manager;
