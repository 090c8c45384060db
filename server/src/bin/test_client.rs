//! Headless viewer for poking at a running server from the terminal
//!
//! Joins as a player, subscribes to updates, turns at random and prints the
//! latest message and scoreboard whenever they change.

use clap::Parser;
use log::{info, warn};
use rand::seq::SliceRandom;
use snake_shared::{Direction, Packet, SPECTATOR_ID};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Player name to join with
    #[arg(short = 'n', long, default_value = "tester")]
    name: String,

    /// Seconds to stay connected
    #[arg(short = 'd', long, default_value = "30")]
    duration: u64,
}

async fn send(
    socket: &UdpSocket,
    packet: &Packet,
    server: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    socket.send_to(&packet.encode()?, server).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    let server = args.server.parse::<SocketAddr>()?;
    info!("Client socket bound to {}", socket.local_addr()?);

    send(&socket, &Packet::Subscribe, server).await?;
    send(&socket, &Packet::CreatePlayer { name: args.name.clone() }, server).await?;

    let mut player_id = None;
    let mut subscription_id = None;
    let mut last_message = String::new();
    let mut heartbeat = interval(Duration::from_secs(1));
    let mut steer = interval(Duration::from_millis(400));
    let deadline = Instant::now() + Duration::from_secs(args.duration);
    let directions = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];
    let mut buffer = vec![0u8; 65536];

    loop {
        tokio::select! {
            received = socket.recv_from(&mut buffer) => {
                let (len, _) = received?;
                match Packet::decode(&buffer[..len]) {
                    Ok(Packet::PlayerCreated { id }) if id == SPECTATOR_ID => {
                        println!("Game is full or over, spectating");
                        send(&socket, &Packet::IncrementSpectators, server).await?;
                    }
                    Ok(Packet::PlayerCreated { id }) => {
                        println!("Joined as player {}", id);
                        player_id = Some(id);
                    }
                    Ok(Packet::Subscribed { subscription_id: id }) => {
                        subscription_id = Some(id);
                    }
                    Ok(Packet::InfoUpdate(info)) => {
                        if let Some(message) = info.messages.first() {
                            if *message != last_message {
                                println!("> {}", message);
                                for line in &info.scoreboard {
                                    println!("    {}", line);
                                }
                                last_message = message.clone();
                            }
                        }
                    }
                    Ok(Packet::PlayersUpdate { .. }) => {}
                    Ok(other) => warn!("Unexpected packet: {:?}", other),
                    Err(e) => warn!("Failed to decode packet: {}", e),
                }
            }
            _ = heartbeat.tick() => {
                send(&socket, &Packet::Heartbeat, server).await?;
            }
            _ = steer.tick() => {
                if let Some(id) = player_id {
                    let direction = *directions
                        .choose(&mut rand::thread_rng())
                        .unwrap_or(&Direction::Up);
                    send(&socket, &Packet::UpdateDirection { id, direction }, server).await?;
                }
            }
            _ = tokio::time::sleep_until(deadline) => break,
        }
    }

    match player_id {
        Some(id) => send(&socket, &Packet::DeletePlayer { id }, server).await?,
        None => send(&socket, &Packet::DecrementSpectators, server).await?,
    }
    if let Some(id) = subscription_id {
        send(&socket, &Packet::Unsubscribe { subscription_id: id }, server).await?;
    }
    println!("Disconnected");

    Ok(())
}
