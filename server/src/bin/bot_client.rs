//! Headless bot that plays against the match server.
//!
//! Creates or joins a room, then wanders around its own region and throws a
//! hook at the last known position of a random opponent every so often.
//! Useful for soak testing and for having someone to play against.

use bincode::{deserialize, serialize};
use clap::Parser;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use shared::{
    ClientEvent, Packet, PlayerId, Position, Rect, ServerEvent, PLAYER_SIZE, PROTOCOL_VERSION,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, timeout};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless bot for the hook arena server", long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:3000")]
    server: String,

    /// Room code to create or join
    #[arg(short, long, default_value = "BOTS")]
    room: String,

    /// Create the room instead of joining it
    #[arg(long)]
    create: bool,

    /// Display name
    #[arg(short, long, default_value = "bot")]
    name: String,

    /// Milliseconds between movement updates
    #[arg(long, default_value = "100")]
    move_ms: u64,

    /// Milliseconds between hook attempts
    #[arg(long, default_value = "1500")]
    hook_ms: u64,
}

#[derive(Default)]
struct BotState {
    id: PlayerId,
    position: Option<Position>,
    area: Option<Rect>,
    respawning: bool,
    opponents: HashMap<PlayerId, Position>,
}

impl BotState {
    fn apply(&mut self, event: ServerEvent) -> bool {
        match event {
            ServerEvent::StartGame {
                positions, bounds, ..
            } => {
                self.position = positions.get(&self.id).copied();
                self.area = bounds.get(&self.id).map(|b| b.inset(PLAYER_SIZE / 2.0));
                self.opponents = positions
                    .into_iter()
                    .filter(|(id, _)| *id != self.id)
                    .collect();
                info!("Match started, spawned at {:?}", self.position);
            }
            ServerEvent::PlayerMove { id, x, y } => {
                self.opponents.insert(id, Position::new(x, y));
            }
            ServerEvent::BlinkEffect {
                player_id,
                new_x,
                new_y,
            } if player_id != self.id => {
                self.opponents.insert(player_id, Position::new(new_x, new_y));
            }
            ServerEvent::StartRespawnCountdown { target } if target == self.id => {
                self.respawning = true;
            }
            ServerEvent::Respawn { x, y, target } => {
                if target == self.id {
                    self.respawning = false;
                    self.position = Some(Position::new(x, y));
                } else {
                    self.opponents.insert(target, Position::new(x, y));
                }
            }
            ServerEvent::HookHit { by, target, .. } => {
                info!("Player {} hooked {}", by, target);
            }
            ServerEvent::ScoreUpdated { player_id, score } => {
                info!("Player {} has {} points", player_id, score);
            }
            ServerEvent::GameOver { winner_name, .. } => {
                info!("{} won the match", winner_name);
            }
            ServerEvent::GameReset => {
                info!("Room reset");
                return false;
            }
            ServerEvent::OpponentDisconnected { message } | ServerEvent::RoomError { message } => {
                warn!("{}", message);
                return false;
            }
            other => debug!("Event: {:?}", other),
        }
        true
    }
}

async fn send(socket: &UdpSocket, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
    socket.send(&serialize(packet)?).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(&args.server).await?;
    info!("Bot bound to {}, server {}", socket.local_addr()?, args.server);

    send(&socket, &Packet::Connect { client_version: PROTOCOL_VERSION }).await?;
    let mut buf = [0u8; 2048];
    let len = timeout(Duration::from_secs(5), socket.recv(&mut buf)).await??;
    let mut state = match deserialize::<Packet>(&buf[..len])? {
        Packet::Connected { client_id } => {
            info!("Connected as client {}", client_id);
            BotState {
                id: client_id,
                ..BotState::default()
            }
        }
        Packet::Disconnected { reason } => return Err(reason.into()),
        other => return Err(format!("unexpected handshake reply {:?}", other).into()),
    };

    let name = Some(args.name.clone());
    let room_code = args.room.clone();
    let request = if args.create {
        ClientEvent::CreateRoom { room_code, name }
    } else {
        ClientEvent::JoinRoom { room_code, name }
    };
    send(&socket, &Packet::Client(request)).await?;

    let mut rng = rand::thread_rng();
    let mut heartbeat = interval(Duration::from_secs(1));
    let mut movement = interval(Duration::from_millis(args.move_ms));
    let mut hooks = interval(Duration::from_millis(args.hook_ms));

    loop {
        tokio::select! {
            received = socket.recv(&mut buf) => {
                let len = received?;
                match deserialize::<Packet>(&buf[..len]) {
                    Ok(Packet::Server(event)) => {
                        if !state.apply(event) {
                            break;
                        }
                    }
                    Ok(Packet::Disconnected { reason }) => {
                        warn!("Disconnected: {}", reason);
                        break;
                    }
                    Ok(other) => debug!("Ignoring {:?}", other),
                    Err(e) => warn!("Bad packet: {}", e),
                }
            }
            _ = heartbeat.tick() => {
                send(&socket, &Packet::Heartbeat).await?;
            }
            _ = movement.tick() => {
                let (Some(position), Some(area)) = (state.position, state.area) else {
                    continue;
                };
                if state.respawning {
                    continue;
                }
                let step = Position::new(
                    position.x + rng.gen_range(-12.0..=12.0),
                    position.y + rng.gen_range(-12.0..=12.0),
                );
                let next = area.clamp(step);
                state.position = Some(next);
                let event = ClientEvent::PlayerMove { id: state.id, x: next.x, y: next.y };
                send(&socket, &Packet::Client(event)).await?;
            }
            _ = hooks.tick() => {
                if state.respawning || state.position.is_none() {
                    continue;
                }
                let targets: Vec<Position> = state.opponents.values().copied().collect();
                let Some(aim) = targets.choose(&mut rng) else {
                    continue;
                };
                let event = ClientEvent::HookFired {
                    player_id: state.id,
                    target_x: aim.x,
                    target_y: aim.y,
                };
                send(&socket, &Packet::Client(event)).await?;
            }
        }
    }

    send(&socket, &Packet::Disconnect).await?;
    info!("Bot finished");
    Ok(())
}
