use thiserror::Error;

/// Gameplay errors recovered inside the session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("player {0} is not in the game")]
    NotFound(u32),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("entity size must be positive, got {0}")]
    EntitySize(i32),
    #[error("board size {board_size} is too small for entities of size {entity_size}")]
    BoardTooSmall { board_size: i32, entity_size: i32 },
    #[error("movement step {step} must be in 1..={entity_size}")]
    MovementStep { step: i32, entity_size: i32 },
    #[error("tick period must be non-zero")]
    TickPeriod,
    #[error("max players must be at least 1")]
    MaxPlayers,
    #[error("win score must be at least 1")]
    WinScore,
    #[error("initial length must be at least 1")]
    InitialLength,
    #[error("subscriber buffer must be at least 1")]
    SubscriberBuffer,
    #[error("{players} players of up to {cells} cells need {bytes} byte updates, over the datagram limit")]
    PacketTooLarge {
        players: usize,
        cells: usize,
        bytes: usize,
    },
}

/// Failures talking to the game server task.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServerError {
    #[error("game server is no longer running")]
    Closed,
    #[error(transparent)]
    Session(#[from] SessionError),
}
