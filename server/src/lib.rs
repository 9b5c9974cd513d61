//! # Hide-and-Seek Server Library
//!
//! Hosts many small hide-and-seek games over WebSocket. Players open a game
//! under a short code, others join with that code, and the server runs each
//! round: it grows a grid, places everyone, relays moves, detects finds and
//! decides who seeks next.
//!
//! ## Architecture
//!
//! ### One Lock, Many Games
//! All games live in a single [`registry::Registry`] behind the
//! [`coordinator::Coordinator`]'s lock. Every command runs start to finish
//! under that lock, so the round logic in [`game`] is plain synchronous code.
//!
//! ### Mailboxes
//! Game logic never touches a socket. Each connection owns a [`mailbox`]
//! that the logic enqueues into; a writer task per connection drains it.
//!
//! ### Protocol
//! Frames are newline separated text, decoded once into
//! [`shared::ClientCommand`] and encoded from [`shared::ServerEvent`].
//!
//! ## Modules
//!
//! - [`identity`]: per-game symbol allocation, including the Santa rule
//! - [`grid`]: terrain selection and grid shaping
//! - [`placement`]: random distinct starting cells
//! - [`game`]: the round state machine
//! - [`registry`]: game codes and the table of live games
//! - [`coordinator`]: the lock and per-connection seats
//! - [`network`]: WebSocket accept loop and per-connection tasks
//! - [`config`]: command line flags
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         port: 9000,
//!         ..ServerConfig::default()
//!     };
//!
//!     let server = Server::bind(&config).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod game;
pub mod grid;
pub mod identity;
pub mod mailbox;
pub mod network;
pub mod placement;
pub mod registry;
