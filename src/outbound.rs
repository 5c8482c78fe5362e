//! Outbound chat messages
//!
//! The core only needs a fire-and-forget `send(room, text)`. Delivery failures are logged and
//! never retried.

use tokio::sync::mpsc;
use tracing::warn;

/// Capability to emit a chat line into a room
pub trait Outbound: Send + Sync {
    fn send(&self, room: &str, text: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub room: String,
    pub text: String,
}

/// Forwards messages to an unbounded channel drained by the transport
#[derive(Debug, Clone)]
pub struct ChannelOutbound {
    sender: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelOutbound {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Outbound for ChannelOutbound {
    fn send(&self, room: &str, text: &str) {
        let message = OutboundMessage {
            room: room.to_string(),
            text: text.to_string(),
        };
        if self.sender.send(message).is_err() {
            warn!(room, "Outbound receiver dropped, message discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_messages_arrive_in_order() {
        let (outbound, mut rx) = ChannelOutbound::new();
        outbound.send("lobby", "one");
        outbound.send("lobby", "two");

        assert_eq!(rx.recv().await.unwrap().text, "one");
        assert_eq!(rx.recv().await.unwrap().text, "two");
    }

    #[test]
    fn test_send_after_receiver_dropped_does_not_panic() {
        let (outbound, rx) = ChannelOutbound::new();
        drop(rx);

        outbound.send("lobby", "lost");
    }
}
