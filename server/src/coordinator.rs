//! Process-wide owner of all games
//!
//! Every command takes the one registry lock for its whole effect, mailbox
//! enqueues included. Nothing awaits while the lock is held apart from
//! acquiring it.

use crate::error::{GameError, InvariantViolation};
use crate::mailbox::Mailbox;
use crate::registry::{Registry, Seat};
use log::{debug, error, info};
use shared::ClientCommand;
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct Coordinator {
    registry: Mutex<Registry>,
}

impl Coordinator {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Mutex::new(registry),
        }
    }

    /// Runs one decoded command from a connection.
    ///
    /// `seat` is the connection's own state: empty until a join or new game
    /// succeeds, then fixed for the life of the connection.
    pub async fn handle(&self, seat: &mut Option<Seat>, mailbox: &Mailbox, command: ClientCommand) {
        let mut registry = self.registry.lock().await;

        if let Some(current) = seat.as_ref() {
            let outcome = registry.dispatch(current, command);
            Self::enforce(outcome);
            return;
        }

        *seat = match command {
            ClientCommand::NewGame { name } => {
                Self::seat_or_reply(registry.new_game(&name, mailbox), mailbox)
            }
            ClientCommand::Join { code, name } => {
                Self::seat_or_reply(registry.join(&code, &name, mailbox), mailbox)
            }
            command => {
                debug!("Dropping {:?} from a connection without a game", command.tag());
                None
            }
        };
    }

    /// Clears the connection's seat, if it ever had one
    pub async fn disconnect(&self, seat: Option<Seat>) {
        let Some(seat) = seat else {
            return;
        };
        let mut registry = self.registry.lock().await;
        let outcome = registry.disconnect(&seat);
        Self::enforce(outcome);
    }

    /// Number of live games
    pub async fn games(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Roster size of a live game
    pub async fn players_in(&self, code: &str) -> Option<usize> {
        self.registry.lock().await.session(code).map(|s| s.len())
    }

    fn seat_or_reply(outcome: Result<Seat, GameError>, mailbox: &Mailbox) -> Option<Seat> {
        match outcome {
            Ok(seat) => Some(seat),
            Err(err) => {
                info!("Refused: {}", err);
                if let Some(reply) = err.reply() {
                    mailbox.deliver(reply);
                }
                None
            }
        }
    }

    /// A broken game invariant means the shared state can't be trusted
    fn enforce(outcome: Result<(), InvariantViolation>) {
        if let Err(violation) = outcome {
            error!("Invariant violated: {}", violation);
            log::logger().flush();
            std::process::abort();
        }
    }
}
