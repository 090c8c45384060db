//! Remote viewer bookkeeping for the UDP front end
//!
//! UDP has no notion of a connection, so the front end remembers what each
//! remote address has created: players it joined with, subscriptions it
//! holds and spectator slots it claimed. An address that stays silent longer
//! than the timeout is treated as disconnected and everything it owns is
//! released in the game.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// What one remote address owns in the game
#[derive(Debug)]
pub struct Connection {
    /// Network address for sending responses
    pub addr: SocketAddr,
    /// Last time we received any packet from this address
    pub last_seen: Instant,
    /// Player ids created from this address
    pub players: Vec<u32>,
    /// Subscription ids registered from this address
    pub subscriptions: Vec<u32>,
    /// Spectator slots claimed and not yet released
    pub spectators: u32,
}

impl Connection {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            last_seen: Instant::now(),
            players: Vec::new(),
            subscriptions: Vec::new(),
            spectators: 0,
        }
    }

    /// Returns true if no packets have been received within `timeout`
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

pub struct ConnectionManager {
    connections: HashMap<SocketAddr, Connection>,
    /// Silence after which an address counts as disconnected
    timeout: Duration,
}

impl ConnectionManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            connections: HashMap::new(),
            timeout,
        }
    }

    /// Records activity from `addr`, creating its entry on first contact
    pub fn touch(&mut self, addr: SocketAddr) -> &mut Connection {
        let connection = self.connections.entry(addr).or_insert_with(|| {
            info!("New viewer at {}", addr);
            Connection::new(addr)
        });
        connection.last_seen = Instant::now();
        connection
    }

    pub fn add_player(&mut self, addr: SocketAddr, player_id: u32) {
        self.touch(addr).players.push(player_id);
    }

    pub fn remove_player(&mut self, addr: SocketAddr, player_id: u32) {
        if let Some(connection) = self.connections.get_mut(&addr) {
            connection.players.retain(|id| *id != player_id);
        }
    }

    pub fn add_subscription(&mut self, addr: SocketAddr, subscription_id: u32) {
        self.touch(addr).subscriptions.push(subscription_id);
    }

    pub fn remove_subscription(&mut self, addr: SocketAddr, subscription_id: u32) {
        if let Some(connection) = self.connections.get_mut(&addr) {
            connection.subscriptions.retain(|id| *id != subscription_id);
        }
    }

    pub fn add_spectator(&mut self, addr: SocketAddr) {
        self.touch(addr).spectators += 1;
    }

    /// Returns false if `addr` holds no spectator slot to release.
    pub fn remove_spectator(&mut self, addr: SocketAddr) -> bool {
        match self.connections.get_mut(&addr) {
            Some(connection) if connection.spectators > 0 => {
                connection.spectators -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, addr: &SocketAddr) -> Option<&Connection> {
        self.connections.get(addr)
    }

    /// Removes and returns every connection that has gone silent
    pub fn check_timeouts(&mut self) -> Vec<Connection> {
        let timed_out: Vec<SocketAddr> = self
            .connections
            .iter()
            .filter(|(_, connection)| connection.is_timed_out(self.timeout))
            .map(|(addr, _)| *addr)
            .collect();

        timed_out
            .into_iter()
            .filter_map(|addr| self.connections.remove(&addr))
            .inspect(|connection| info!("Viewer at {} timed out", connection.addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
