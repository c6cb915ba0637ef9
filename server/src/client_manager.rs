//! Connection tracking for the UDP transport.
//!
//! UDP has no connections, so the server keeps its own roster: every
//! address that completed the `Connect` handshake gets a connection id,
//! which doubles as its player id inside the arena. The roster also tracks
//! when each address was last heard from so silent clients can be dropped.

use log::info;
use shared::PlayerId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connected client.
#[derive(Debug)]
pub struct Client {
    /// Connection id, also used as the player id.
    pub id: PlayerId,
    /// Where responses for this client are sent.
    pub addr: SocketAddr,
    /// Last time any packet arrived from this client.
    pub last_seen: Instant,
}

impl Client {
    pub fn new(id: PlayerId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    /// True when nothing arrived from this client within `timeout`.
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// All connected clients, capped at `max_clients`.
///
/// Ids start at 1 and are never reused within a server run, so a late
/// packet for a departed client can never be attributed to a newcomer.
pub struct ClientManager {
    clients: HashMap<PlayerId, Client>,
    next_client_id: PlayerId,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Registers `addr` and returns its new id, or None when the server is full.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<PlayerId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));

        Some(client_id)
    }

    /// Returns true if the client was still registered.
    pub fn remove_client(&mut self, client_id: PlayerId) -> bool {
        if let Some(client) = self.clients.remove(&client_id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<PlayerId> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    pub fn addr_of(&self, client_id: PlayerId) -> Option<SocketAddr> {
        self.clients.get(&client_id).map(|client| client.addr)
    }

    /// Marks the client as alive. Returns false for unknown ids.
    pub fn touch(&mut self, client_id: PlayerId) -> bool {
        match self.clients.get_mut(&client_id) {
            Some(client) => {
                client.last_seen = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Removes and returns every client silent for longer than `timeout`.
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<PlayerId> {
        let mut timed_out: Vec<PlayerId> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();
        timed_out.sort_unstable();

        for client_id in &timed_out {
            self.remove_client(*client_id);
        }

        timed_out
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
