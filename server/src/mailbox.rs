//! Per-player outbound mailboxes
//!
//! Game logic runs under the coordinator lock, so delivering an event must
//! never wait on a socket. Every connection owns an unbounded queue; the
//! lock holder only enqueues, and the connection's writer task drains the
//! queue to the wire on its own schedule.

use log::warn;
use shared::ServerEvent;
use tokio::sync::mpsc;

/// Receiving half, owned by a connection's writer task
pub type Outbox = mpsc::UnboundedReceiver<ServerEvent>;

/// Sending half of a player's queue
#[derive(Debug, Clone)]
pub struct Mailbox {
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl Mailbox {
    /// Creates a mailbox and the outbox that drains it
    pub fn channel() -> (Self, Outbox) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Enqueues without blocking. Returns false when the connection is gone;
    /// the event is dropped in that case.
    pub fn deliver(&self, event: ServerEvent) -> bool {
        match self.sender.send(event) {
            Ok(()) => true,
            Err(mpsc::error::SendError(event)) => {
                warn!("Dropping {:?} event for closed connection", event.tag());
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Delivers one event to every mailbox, best effort
pub fn fan_out<'a, I>(mailboxes: I, event: &ServerEvent) -> usize
where
    I: IntoIterator<Item = &'a Mailbox>,
{
    mailboxes
        .into_iter()
        .filter(|mailbox| mailbox.deliver(event.clone()))
        .count()
}

/// Collects everything currently queued without waiting
pub fn drain(outbox: &mut Outbox) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = outbox.try_recv() {
        events.push(event);
    }
    events
}
