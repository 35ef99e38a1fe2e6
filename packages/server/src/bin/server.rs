//! Chat relay server.
//!
//! Run with:
//! ```not_rust
//! CHATRELAY_JWT_SECRET=secret cargo run --bin chatrelay-server
//! cargo run --bin chatrelay-server -- --host 0.0.0.0 --port 3000 --jwt-secret secret
//! cargo run --bin chatrelay-server -- --jwt-secret secret --database-url sqlite::memory:
//! ```

use std::sync::Arc;

use chatrelay_server::{
    hub::{Hub, HubConfig},
    infrastructure::{
        auth::JwtIdentityGateway,
        repository::{SqliteMessageArchive, SqliteRoomDirectory, sqlite},
    },
    ui::{AppState, ConnectionSettings, Server},
    usecase::CreateRoomUseCase,
};
use chatrelay_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chatrelay-server")]
#[command(about = "Room-scoped WebSocket chat relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "CHATRELAY_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "CHATRELAY_PORT", default_value = "8080")]
    port: u16,

    /// Shared secret used to verify HS256 tokens
    #[arg(long, env = "CHATRELAY_JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Only accept tokens issued by this issuer
    #[arg(long, env = "CHATRELAY_JWT_ISSUER")]
    jwt_issuer: Option<String>,

    /// SQLite database holding rooms and message history
    #[arg(long, env = "CHATRELAY_DATABASE_URL", default_value = "sqlite://chatrelay.db")]
    database_url: String,

    /// Name of the room created at startup when none exists
    #[arg(long, default_value = "General")]
    default_room: String,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // Initialize dependencies in order:
    // 1. Collaborators (database, clock, directory, archive, identity gateway)
    // 2. Default room
    // 3. Hub
    // 4. AppState
    // 5. Server

    // 1. Create collaborators
    let pool = match sqlite::connect(&args.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to open database '{}': {}", args.database_url, e);
            std::process::exit(1);
        }
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let room_directory = Arc::new(SqliteRoomDirectory::new(pool.clone(), clock.clone()));
    let message_archive = Arc::new(SqliteMessageArchive::new(pool));
    let identity_gateway = Arc::new(JwtIdentityGateway::new(
        &args.jwt_secret,
        args.jwt_issuer.as_deref(),
    ));

    // 2. Ensure the default room exists
    match CreateRoomUseCase::new(room_directory.clone())
        .ensure_default_room(&args.default_room)
        .await
    {
        Ok(room) => tracing::info!("Room {} '{}' ready", room.id, room.name.as_str()),
        Err(e) => {
            tracing::error!("Failed to prepare the default room: {}", e);
            std::process::exit(1);
        }
    }

    // 3. Start the hub
    let (hub, _hub_task) = Hub::spawn(message_archive, clock.clone(), HubConfig::default());

    // 4. Create and run the server
    let state = AppState::new(
        identity_gateway,
        room_directory,
        hub,
        clock,
        ConnectionSettings::default(),
    );
    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
