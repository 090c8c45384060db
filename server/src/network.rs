//! UDP front end translating packets into game server requests

use crate::connections::{Connection, ConnectionManager};
use crate::error::ServerError;
use crate::game_server::GameHandle;
use crate::subscribers::{Update, UpdateReceiver};
use log::{debug, error, info, warn};
use snake_shared::{Packet, SPECTATOR_ID};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::interval;

/// Largest datagram we accept
const RECV_BUFFER: usize = 65536;

/// Messages forwarded per info update; keeps datagrams under the UDP limit
const WIRE_MESSAGES: usize = 100;

/// Network server bridging remote viewers and the game server task
pub struct NetworkServer {
    socket: Arc<UdpSocket>,
    game: GameHandle,
    connections: ConnectionManager,
}

impl NetworkServer {
    pub async fn bind(
        addr: &str,
        game: GameHandle,
        client_timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        Ok(NetworkServer {
            socket,
            game,
            connections: ConnectionManager::new(client_timeout),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = packet.encode()?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    async fn send_packet(&self, packet: &Packet, addr: SocketAddr) {
        if let Err(e) = Self::send_packet_impl(&self.socket, packet, addr).await {
            error!("Failed to send packet to {}: {}", addr, e);
        }
    }

    /// Spawns task that relays one subscription's updates to its address
    ///
    /// The task ends on its own once the game server drops the subscription.
    fn spawn_forwarder(&self, subscription_id: u32, addr: SocketAddr, mut updates: UpdateReceiver) {
        let socket = Arc::clone(&self.socket);

        tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                let packet = match update {
                    Update::Info(mut info) => {
                        info.messages.truncate(WIRE_MESSAGES);
                        Packet::InfoUpdate(info)
                    }
                    Update::Players(locations) => Packet::PlayersUpdate { locations },
                };

                if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                    warn!("Failed to push update to subscriber {}: {}", subscription_id, e);
                }
            }
            debug!("Subscription {} for {} closed", subscription_id, addr);
        });
    }

    /// Applies one packet from `addr`
    ///
    /// Gameplay failures such as unknown ids are logged and ignored; only a
    /// stopped game server is returned as an error.
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) -> Result<(), ServerError> {
        self.connections.touch(addr);

        match packet {
            Packet::CreatePlayer { name } => {
                let id = self.game.create_player(name).await?;
                if id != SPECTATOR_ID {
                    self.connections.add_player(addr, id);
                }
                self.send_packet(&Packet::PlayerCreated { id }, addr).await;
            }

            Packet::DeletePlayer { id } => {
                self.connections.remove_player(addr, id);
                match self.game.delete_player(id).await {
                    Ok(()) => {}
                    Err(ServerError::Session(e)) => warn!("Delete from {}: {}", addr, e),
                    Err(e) => return Err(e),
                }
            }

            Packet::UpdateDirection { id, direction } => {
                match self.game.update_direction(id, direction).await {
                    Ok(_) => {}
                    Err(ServerError::Session(e)) => debug!("Direction from {}: {}", addr, e),
                    Err(e) => return Err(e),
                }
            }

            Packet::Subscribe => {
                let (subscription_id, updates) = self.game.subscribe().await?;
                self.connections.add_subscription(addr, subscription_id);
                self.spawn_forwarder(subscription_id, addr, updates);
                self.send_packet(&Packet::Subscribed { subscription_id }, addr)
                    .await;
            }

            Packet::Unsubscribe { subscription_id } => {
                self.connections.remove_subscription(addr, subscription_id);
                self.game.unsubscribe(subscription_id).await?;
            }

            Packet::IncrementSpectators => {
                self.connections.add_spectator(addr);
                self.game.increment_spectators().await?;
            }

            Packet::DecrementSpectators => {
                if self.connections.remove_spectator(addr) {
                    self.game.decrement_spectators().await?;
                }
            }

            Packet::Heartbeat => {}

            _ => {
                warn!("Unexpected packet type from viewer at {}", addr);
            }
        }

        Ok(())
    }

    /// Releases everything a silent viewer owned
    async fn release(&mut self, connection: Connection) -> Result<(), ServerError> {
        for id in connection.players {
            match self.game.delete_player(id).await {
                Ok(()) | Err(ServerError::Session(_)) => {}
                Err(e) => return Err(e),
            }
        }
        for subscription_id in connection.subscriptions {
            self.game.unsubscribe(subscription_id).await?;
        }
        for _ in 0..connection.spectators {
            self.game.decrement_spectators().await?;
        }
        Ok(())
    }

    /// Receives packets until the game server stops
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut buffer = vec![0u8; RECV_BUFFER];
        let mut timeout_check = interval(Duration::from_secs(1));

        loop {
            let result = tokio::select! {
                received = self.socket.recv_from(&mut buffer) => {
                    match received {
                        Ok((len, addr)) => match Packet::decode(&buffer[..len]) {
                            Ok(packet) => self.handle_packet(packet, addr).await,
                            Err(e) => {
                                warn!("Failed to deserialize packet from {}: {}", addr, e);
                                Ok(())
                            }
                        },
                        Err(e) => {
                            error!("Error receiving packet: {}", e);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                            Ok(())
                        }
                    }
                },

                _ = timeout_check.tick() => {
                    let mut result = Ok(());
                    for connection in self.connections.check_timeouts() {
                        result = self.release(connection).await;
                        if result.is_err() {
                            break;
                        }
                    }
                    result
                },
            };

            if let Err(ServerError::Closed) = result {
                info!("Game server stopped, closing network server");
                return Ok(());
            }
        }
    }
}
