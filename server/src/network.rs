//! WebSocket front end: one reader and one writer task per connection

use crate::config::ServerConfig;
use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::mailbox::{Mailbox, Outbox};
use crate::registry::{Registry, Seat};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::ClientCommand;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

type Writer = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Listening socket plus the coordinator every connection reports to
pub struct Server {
    listener: TcpListener,
    coordinator: Arc<Coordinator>,
}

impl Server {
    /// Validates the configuration and binds the listener
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(config.address()).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let registry = Registry::new(config.max_games, config.code_length, config.seed);
        Ok(Server {
            listener,
            coordinator: Arc::new(Coordinator::new(registry)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn coordinator(&self) -> Arc<Coordinator> {
        Arc::clone(&self.coordinator)
    }

    /// Accepts connections until the task is dropped
    pub async fn run(self) -> Result<()> {
        info!("Server started successfully");

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let coordinator = Arc::clone(&self.coordinator);
            tokio::spawn(async move {
                if let Err(e) = serve(stream, peer, coordinator).await {
                    debug!("Connection from {} ended with error: {}", peer, e);
                }
            });
        }
    }
}

/// Upgrades one TCP stream and pumps frames until either side hangs up
async fn serve(stream: TcpStream, peer: SocketAddr, coordinator: Arc<Coordinator>) -> Result<()> {
    let ws = accept_async(stream).await?;
    debug!("WebSocket connection from {}", peer);

    let (write, mut read) = ws.split();
    let (mailbox, outbox) = Mailbox::channel();
    let writer = tokio::spawn(pump_outbox(write, outbox, peer));

    let mut seat: Option<Seat> = None;
    while let Some(frame) = read.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(e) => {
                debug!("Read from {} failed: {}", peer, e);
                break;
            }
        };

        match message {
            Message::Text(text) => match text.as_str().parse::<ClientCommand>() {
                Ok(command) => {
                    debug!("{:?} from {}", command.tag(), peer);
                    coordinator.handle(&mut seat, &mailbox, command).await;
                }
                Err(e) => debug!("Ignoring frame from {}: {}", peer, e),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    if let Some(seat) = &seat {
        info!("Connection for {}/{} closed", seat.code, seat.name);
    }
    coordinator.disconnect(seat).await;
    writer.abort();
    Ok(())
}

/// Writes queued events to the socket in order
async fn pump_outbox(mut write: Writer, mut outbox: Outbox, peer: SocketAddr) {
    while let Some(event) = outbox.recv().await {
        debug!("Sending {:?} to {}", event.tag(), peer);
        if let Err(e) = write.send(Message::text(event.to_string())).await {
            debug!("Write to {} failed: {}", peer, e);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;
    use tokio_test::assert_ok;
    use tokio_tungstenite::{connect_async, tungstenite};

    async fn start() -> (SocketAddr, Arc<Coordinator>) {
        let config = ServerConfig {
            port: 0,
            seed: Some(5),
            ..ServerConfig::default()
        };
        let server = assert_ok!(Server::bind(&config).await);
        let addr = assert_ok!(server.local_addr());
        let coordinator = server.coordinator();
        tokio::spawn(server.run());
        (addr, coordinator)
    }

    async fn next_text<S>(ws: &mut S) -> String
    where
        S: futures_util::Stream<Item = std::result::Result<Message, tungstenite::Error>> + Unpin,
    {
        loop {
            let message = ws.next().await.expect("open stream").expect("valid frame");
            if let Message::Text(text) = message {
                return text.as_str().to_string();
            }
        }
    }

    #[tokio::test]
    async fn test_bind_rejects_bad_config() {
        let config = ServerConfig {
            port: 0,
            max_games: 0,
            ..ServerConfig::default()
        };
        assert!(Server::bind(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_new_game_and_disconnect() {
        let (addr, coordinator) = start().await;
        let (mut ws, _) = assert_ok!(connect_async(format!("ws://{}/", addr)).await);

        assert_ok!(ws.send(Message::text("new game\nAnn")).await);
        let reply = next_text(&mut ws).await;
        let lines: Vec<&str> = reply.split('\n').collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "game initialized");
        assert_eq!(lines[1].len(), 4);
        assert_eq!(lines[3], "Ann");
        assert_eq!(coordinator.games().await, 1);

        assert_ok!(ws.close(None).await);
        for _ in 0..100 {
            if coordinator.games().await == 0 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(coordinator.games().await, 0);
    }

    #[tokio::test]
    async fn test_malformed_frames_are_ignored() {
        let (addr, _coordinator) = start().await;
        let (mut ws, _) = assert_ok!(connect_async(format!("ws://{}/socket", addr)).await);

        assert_ok!(ws.send(Message::text("dance")).await);
        assert_ok!(ws.send(Message::text("move to\nsix\n1")).await);
        assert_ok!(ws.send(Message::binary(vec![1u8, 2, 3])).await);
        assert_ok!(ws.send(Message::text("start")).await);
        assert_ok!(ws.send(Message::text("join\nZZZZ\nBen")).await);

        assert_eq!(next_text(&mut ws).await, "no such game\nZZZZ");
    }
}
