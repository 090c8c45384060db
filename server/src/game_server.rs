//! Game server task: the single owner of the session
//!
//! Every request from the outside world becomes a `GameCommand` on one
//! mailbox. The server task alternates between that mailbox and the tick
//! timer, so commands and ticks are applied strictly one after another and a
//! tick can never overlap another tick. The timer only runs while the
//! session is `Running`, and with `MissedTickBehavior::Delay` it is re-armed
//! relative to when the previous tick finished.

use crate::config::GameConfig;
use crate::error::{ConfigError, ServerError, SessionError};
use crate::session::{GamePhase, GameSession};
use crate::subscribers::{SubscriberRegistry, UpdateReceiver};
use log::{debug, info};
use snake_shared::{Direction, GameInformation, PlayerLocations};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Depth of the command mailbox
const COMMAND_QUEUE: usize = 1000;

/// Ticks between periodic diagnostics in the log
const DIAGNOSTIC_TICKS: u64 = 500;

/// Requests processed by the game server task
#[derive(Debug)]
pub enum GameCommand {
    CreatePlayer {
        name: String,
        reply: oneshot::Sender<u32>,
    },
    DeletePlayer {
        id: u32,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    UpdateDirection {
        id: u32,
        direction: Direction,
        reply: oneshot::Sender<Result<bool, SessionError>>,
    },
    Subscribe {
        reply: oneshot::Sender<(u32, UpdateReceiver)>,
    },
    Unsubscribe {
        subscription_id: u32,
        reply: oneshot::Sender<bool>,
    },
    IncrementSpectators,
    DecrementSpectators,
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown,
}

/// Point-in-time view of the session, mostly for diagnostics and tests
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: GamePhase,
    pub tick: u64,
    pub players: usize,
    pub spectators: u32,
    pub subscribers: usize,
    pub info: GameInformation,
    pub locations: PlayerLocations,
}

/// Cloneable front end for talking to the game server task
#[derive(Debug, Clone)]
pub struct GameHandle {
    commands: mpsc::Sender<GameCommand>,
}

impl GameHandle {
    async fn send(&self, command: GameCommand) -> Result<(), ServerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ServerError::Closed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> GameCommand,
    ) -> Result<T, ServerError> {
        let (reply, response) = oneshot::channel();
        self.send(build(reply)).await?;
        response.await.map_err(|_| ServerError::Closed)
    }

    /// Joins the game; `SPECTATOR_ID` means no slot was available.
    pub async fn create_player(&self, name: impl Into<String>) -> Result<u32, ServerError> {
        let name = name.into();
        self.request(|reply| GameCommand::CreatePlayer { name, reply })
            .await
    }

    pub async fn delete_player(&self, id: u32) -> Result<(), ServerError> {
        self.request(|reply| GameCommand::DeletePlayer { id, reply })
            .await??;
        Ok(())
    }

    /// Returns whether the new direction was accepted.
    pub async fn update_direction(&self, id: u32, direction: Direction) -> Result<bool, ServerError> {
        let accepted = self
            .request(|reply| GameCommand::UpdateDirection {
                id,
                direction,
                reply,
            })
            .await??;
        Ok(accepted)
    }

    pub async fn subscribe(&self) -> Result<(u32, UpdateReceiver), ServerError> {
        self.request(|reply| GameCommand::Subscribe { reply }).await
    }

    pub async fn unsubscribe(&self, subscription_id: u32) -> Result<bool, ServerError> {
        self.request(|reply| GameCommand::Unsubscribe {
            subscription_id,
            reply,
        })
        .await
    }

    pub async fn increment_spectators(&self) -> Result<(), ServerError> {
        self.send(GameCommand::IncrementSpectators).await
    }

    pub async fn decrement_spectators(&self) -> Result<(), ServerError> {
        self.send(GameCommand::DecrementSpectators).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, ServerError> {
        self.request(|reply| GameCommand::Snapshot { reply }).await
    }

    pub async fn shutdown(&self) -> Result<(), ServerError> {
        self.send(GameCommand::Shutdown).await
    }
}

pub struct GameServer {
    session: GameSession,
    commands: mpsc::Receiver<GameCommand>,
    tick_period: Duration,
}

impl GameServer {
    /// Validates the configuration and builds an idle server with its handle
    pub fn new(config: GameConfig) -> Result<(GameServer, GameHandle), ConfigError> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        let tick_period = config.tick_period;
        let subscribers = SubscriberRegistry::new(config.subscriber_buffer);
        let server = GameServer {
            session: GameSession::new(config, subscribers),
            commands: rx,
            tick_period,
        };

        Ok((server, GameHandle { commands: tx }))
    }

    /// Builds a server and runs it on a new task
    pub fn spawn(config: GameConfig) -> Result<(GameHandle, JoinHandle<()>), ConfigError> {
        let (server, handle) = Self::new(config)?;
        let task = tokio::spawn(server.run());
        Ok((handle, task))
    }

    /// Serves commands and ticks until shut down or every handle is dropped
    pub async fn run(mut self) {
        let mut tick_interval = interval(self.tick_period);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut clock_running = false;

        info!(
            "Game server started ({}ms ticks, {} max players)",
            self.tick_period.as_millis(),
            self.session.config().max_players
        );

        loop {
            let running = self.session.phase() == GamePhase::Running;
            if running && !clock_running {
                // First tick one full period after the clock starts
                tick_interval.reset();
            }
            clock_running = running;

            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(GameCommand::Shutdown) | None => {
                            info!("Game server shutting down");
                            break;
                        }
                        Some(command) => self.handle_command(command),
                    }
                },

                _ = tick_interval.tick(), if running => {
                    self.session.tick();

                    let tick = self.session.tick_count();
                    if tick % DIAGNOSTIC_TICKS == 0 {
                        debug!(
                            "Tick {}: {} players, {} subscribers, {} spectators",
                            tick,
                            self.session.player_count(),
                            self.session.subscriber_count(),
                            self.session.spectators()
                        );
                    }
                },
            }
        }
    }

    /// Applies one command to the session. A caller that stopped waiting
    /// for its reply is not an error.
    fn handle_command(&mut self, command: GameCommand) {
        match command {
            GameCommand::CreatePlayer { name, reply } => {
                let _ = reply.send(self.session.create_player(&name));
            }
            GameCommand::DeletePlayer { id, reply } => {
                let _ = reply.send(self.session.delete_player(id));
            }
            GameCommand::UpdateDirection {
                id,
                direction,
                reply,
            } => {
                let _ = reply.send(self.session.update_direction(id, direction));
            }
            GameCommand::Subscribe { reply } => {
                let _ = reply.send(self.session.subscribe());
            }
            GameCommand::Unsubscribe {
                subscription_id,
                reply,
            } => {
                let _ = reply.send(self.session.unsubscribe(subscription_id));
            }
            GameCommand::IncrementSpectators => self.session.increment_spectators(),
            GameCommand::DecrementSpectators => self.session.decrement_spectators(),
            GameCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            GameCommand::Shutdown => {}
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.session.phase(),
            tick: self.session.tick_count(),
            players: self.session.player_count(),
            spectators: self.session.spectators(),
            subscribers: self.session.subscriber_count(),
            info: self.session.game_information(),
            locations: self.session.player_locations(),
        }
    }
}
