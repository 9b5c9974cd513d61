use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::identity::identity_capacity;
use server::network::Server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = ServerConfig::parse();

    let server = Server::bind(&config).await?;
    info!("Maximum games: {}", config.max_games);
    info!("Maximum players per game: {}", identity_capacity());

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
