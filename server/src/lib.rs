//! # Snake Arena Server Library
//!
//! Authoritative server for a small real-time multiplayer snake arena. Up to
//! a fixed number of players steer snakes around a bounded square board,
//! eat food to grow and score, and are reset when they hit a wall, another
//! snake or themselves. The first player to reach the win score ends the
//! game. Connected viewers receive pushed snapshots of the board.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server runs the only copy of the game rules. Viewers send requests
//! (join, leave, turn) and render whatever the server pushes back.
//!
//! ### State Distribution
//! After every tick the server pushes every player's cells to all
//! subscribers. Whenever a message visible to players is posted (a join, a
//! point scored, a crash) it also pushes the scoreboard, the message log and
//! the food position. Delivery is best effort and never slows the game down.
//!
//! ## Architecture Design
//!
//! ### Single Owner Task
//! One task owns the `GameSession` and serves both the tick timer and a
//! command mailbox. Requests from any number of callers are queued and
//! applied between ticks, so ticks never overlap and no locking is needed.
//!
//! ### UDP Front End
//! The bundled network layer decodes bincode packets from UDP and turns them
//! into mailbox requests. Each subscription gets its own forwarding task.
//!
//! ## Module Organization
//!
//! - `config`: board and gameplay constants, message visibility
//! - `snake`: the player entity
//! - `collision`: pure wall, self, enemy and food predicates
//! - `session`: game state, lifecycle and the tick algorithm
//! - `subscribers`: viewer registry and non-blocking fan-out
//! - `game_server`: the owner task and its `GameHandle`
//! - `connections`: per-address bookkeeping for the UDP front end
//! - `network`: the UDP front end
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use snake_server::config::GameConfig;
//! use snake_server::game_server::GameServer;
//! use snake_server::network::NetworkServer;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (game, _task) = GameServer::spawn(GameConfig::default())?;
//!
//!     let mut server =
//!         NetworkServer::bind("127.0.0.1:8080", game, Duration::from_secs(5)).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod collision;
pub mod config;
pub mod connections;
pub mod error;
pub mod game_server;
pub mod network;
pub mod session;
pub mod snake;
pub mod subscribers;
