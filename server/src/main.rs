use clap::Parser;
use log::{error, info};
use snake_server::config::GameConfig;
use snake_server::game_server::GameServer;
use snake_server::network::NetworkServer;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Milliseconds between game ticks
    #[arg(short, long, default_value = "20")]
    tick_ms: u64,

    /// Players allowed at once; later joiners spectate
    #[arg(short, long, default_value = "8")]
    max_players: usize,

    /// Score that ends the game
    #[arg(short, long, default_value = "30")]
    win_score: u32,

    /// Width and height of the board
    #[arg(short, long, default_value = "500")]
    board_size: i32,

    /// Fixed RNG seed for reproducible spawns
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds of silence before a viewer is dropped
    #[arg(long, default_value = "5")]
    client_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = GameConfig {
        board_size: args.board_size,
        tick_period: Duration::from_millis(args.tick_ms),
        max_players: args.max_players,
        win_score: args.win_score,
        seed: args.seed,
        ..GameConfig::default()
    };

    let (game, game_task) = GameServer::spawn(config)?;

    let address = format!("{}:{}", args.host, args.port);
    let mut server =
        NetworkServer::bind(&address, game.clone(), Duration::from_secs(args.client_timeout))
            .await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Network server failed: {}", e);
            }
        }
        result = game_task => {
            if let Err(e) = result {
                error!("Game server task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            let _ = game.shutdown().await;
        }
    }

    Ok(())
}
