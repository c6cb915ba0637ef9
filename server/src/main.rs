use clap::Parser;
use log::{error, info};
use server::config::{ArenaConfig, ServerConfig};
use server::network::{Server, ServerMessage};
use shared::{
    DEFAULT_ROOM_CAPACITY, HOOK_TICK_MS, RESET_DELAY_MS, RESPAWN_DELAY_MS, WIN_SCORE,
};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Authoritative hook arena match server", long_about = None)]
struct Args {
    /// IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// UDP port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Maximum number of simultaneous connections
    #[arg(short = 'm', long, default_value = "64")]
    max_clients: usize,

    /// Players per room; the match starts when a room is full (2-4)
    #[arg(short = 'c', long, default_value_t = DEFAULT_ROOM_CAPACITY)]
    room_capacity: usize,

    /// Points needed to win a match
    #[arg(short, long, default_value_t = WIN_SCORE)]
    win_score: u32,

    /// Hook flight tick in milliseconds
    #[arg(long, default_value_t = HOOK_TICK_MS)]
    hook_tick_ms: u64,

    /// Delay before a hooked player reappears, in milliseconds
    #[arg(long, default_value_t = RESPAWN_DELAY_MS)]
    respawn_delay_ms: u64,

    /// Delay between a win and the room reset, in milliseconds
    #[arg(long, default_value_t = RESET_DELAY_MS)]
    reset_delay_ms: u64,

    /// Seconds of silence before a client is dropped
    #[arg(long, default_value = "5")]
    client_timeout_secs: u64,

    /// Seed for spawn positions; random if omitted
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: format!("{}:{}", self.host, self.port),
            max_clients: self.max_clients,
            client_timeout: Duration::from_secs(self.client_timeout_secs),
        }
    }

    fn arena_config(&self) -> ArenaConfig {
        ArenaConfig {
            room_capacity: self.room_capacity,
            win_score: self.win_score,
            hook_tick: Duration::from_millis(self.hook_tick_ms),
            respawn_delay: Duration::from_millis(self.respawn_delay_ms),
            reset_delay: Duration::from_millis(self.reset_delay_ms),
            rng_seed: self.seed,
            ..ArenaConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let arena_config = args.arena_config();
    if let Err(e) = arena_config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    info!(
        "Rooms of {} players, first to {} wins",
        arena_config.room_capacity, arena_config.win_score
    );

    let mut server = Server::new(&args.server_config(), arena_config).await?;
    let handle = server.handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
            let _ = handle.send(ServerMessage::Shutdown);
        }
    });

    server.run().await
}
