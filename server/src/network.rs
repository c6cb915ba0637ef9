//! Server network layer: UDP transport, connection handshake and the event
//! loop that drives the arena.

use crate::arena::{Arena, Timer};
use crate::client_manager::ClientManager;
use crate::config::{ArenaConfig, ServerConfig};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, PlayerId, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

const RECV_BUFFER_SIZE: usize = 2048;
const STATS_INTERVAL: Duration = Duration::from_secs(30);

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ClientsTimedOut {
        client_ids: Vec<PlayerId>,
    },
    /// A deferred arena callback whose delay has elapsed.
    TimerFired(Timer),
    Shutdown,
}

/// Messages sent from the main loop to the sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    /// Addressed by connection id; unknown ids are skipped.
    Deliver {
        packet: Packet,
        client_ids: Vec<PlayerId>,
    },
}

/// Owns the socket and the arena. All arena calls happen on the task that
/// runs [`Server::run`], one message at a time.
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    arena: Arena,
    client_timeout: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(config: &ServerConfig, arena_config: ArenaConfig) -> Result<Self, BoxError> {
        arena_config.validate()?;
        let socket = Arc::new(UdpSocket::bind(&config.bind_addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(config.max_clients))),
            arena: Arena::new(arena_config),
            client_timeout: config.client_timeout,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Sender into the main loop, e.g. to request [`ServerMessage::Shutdown`].
    pub fn handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; RECV_BUFFER_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match deserialize::<Packet>(&buffer[..len]) {
                        Ok(packet) => {
                            if server_tx
                                .send(ServerMessage::PacketReceived { packet, addr })
                                .is_err()
                            {
                                debug!("Main loop gone, receiver stopping");
                                break;
                            }
                        }
                        Err(e) => warn!("Failed to deserialize packet from {}: {}", addr, e),
                    },
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::Deliver { packet, client_ids } => {
                        let addrs: Vec<(PlayerId, SocketAddr)> = {
                            let clients_guard = clients.read().await;
                            client_ids
                                .iter()
                                .filter_map(|id| clients_guard.addr_of(*id).map(|addr| (*id, addr)))
                                .collect()
                        };

                        for (client_id, addr) in addrs {
                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();
        let timeout = self.client_timeout;

        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let client_ids = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts(timeout)
                };
                if client_ids.is_empty() {
                    continue;
                }

                info!("Clients timed out: {:?}", client_ids);
                if server_tx
                    .send(ServerMessage::ClientsTimedOut { client_ids })
                    .is_err()
                {
                    break;
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), BoxError> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Processes incoming packets and feeds client events to the arena
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Client connecting from {} (version: {})",
                    addr, client_version
                );
                if client_version != PROTOCOL_VERSION {
                    self.send_packet(
                        Packet::Disconnected {
                            reason: "Protocol version mismatch".to_string(),
                        },
                        addr,
                    );
                    return;
                }

                // A reconnect from the same address starts a fresh session.
                let existing_client_id = {
                    let mut clients = self.clients.write().await;
                    let existing = clients.find_client_by_addr(addr);
                    if let Some(existing_id) = existing {
                        info!("Removing existing client {} from {}", existing_id, addr);
                        clients.remove_client(existing_id);
                    }
                    existing
                };
                if let Some(existing_id) = existing_client_id {
                    self.arena.handle_disconnect(existing_id);
                }

                let client_id = {
                    let mut clients = self.clients.write().await;
                    clients.add_client(addr)
                };

                let response = match client_id {
                    Some(client_id) => Packet::Connected { client_id },
                    None => Packet::Disconnected {
                        reason: "Server full".to_string(),
                    },
                };
                self.send_packet(response, addr);
            }

            Packet::Heartbeat => {
                let mut clients = self.clients.write().await;
                if let Some(client_id) = clients.find_client_by_addr(addr) {
                    clients.touch(client_id);
                }
            }

            Packet::Disconnect => {
                let client_id = {
                    let mut clients = self.clients.write().await;
                    let found = clients.find_client_by_addr(addr);
                    if let Some(client_id) = found {
                        clients.remove_client(client_id);
                    }
                    found
                };

                if let Some(client_id) = client_id {
                    self.arena.handle_disconnect(client_id);
                }
            }

            Packet::Client(event) => {
                let client_id = {
                    let mut clients = self.clients.write().await;
                    let found = clients.find_client_by_addr(addr);
                    if let Some(client_id) = found {
                        clients.touch(client_id);
                    }
                    found
                };

                match client_id {
                    Some(client_id) => self.arena.handle_event(client_id, event),
                    None => warn!("Event {} from unconnected address {}", event.name(), addr),
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }

        self.flush();
    }

    /// Hands queued arena output to the sender task and arms queued timers.
    fn flush(&mut self) {
        for dispatch in self.arena.take_dispatches() {
            let message = GameMessage::Deliver {
                packet: Packet::Server(dispatch.event),
                client_ids: dispatch.recipients,
            };
            if let Err(e) = self.game_tx.send(message) {
                error!("Failed to queue dispatch: {}", e);
            }
        }

        for scheduled in self.arena.take_timers() {
            let server_tx = self.server_tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(scheduled.delay).await;
                if server_tx
                    .send(ServerMessage::TimerFired(scheduled.timer))
                    .is_err()
                {
                    debug!("Timer fired after shutdown");
                }
            });
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), BoxError> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut stats_interval = interval(STATS_INTERVAL);

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientsTimedOut { client_ids }) => {
                            self.arena.handle_disconnects(&client_ids);
                            self.flush();
                        },
                        Some(ServerMessage::TimerFired(timer)) => {
                            self.arena.handle_timer(timer);
                            self.flush();
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = stats_interval.tick() => {
                    let client_count = self.clients.read().await.len();
                    if client_count > 0 {
                        debug!(
                            "{} clients, {} players in {} rooms",
                            client_count,
                            self.arena.player_count(),
                            self.arena.room_count()
                        );
                    }
                },
            }
        }

        Ok(())
    }
}
