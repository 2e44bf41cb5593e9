//! In-process message bus
//!
//! Components publish `Message`s (a type string plus a JSON payload) and any
//! number of subscribers receive every message emitted after they subscribed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

/// Emitted when the remote device configuration changed
pub const CONFIGURATION_UPDATED: &str = "configuration.updated";

/// Emitted when the local settings file was reloaded
pub const CONFIGURATION_RELOADED: &str = "configuration.reloaded";

/// Emitted when a watched file changed
pub const FILE_CHANGED: &str = "file.changed";

/// Emitted when the remote API rejected the device credentials
pub const DEVICE_NOT_PAIRED: &str = "device.not.paired";

/// A typed message carried on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message type, e.g. `configuration.updated`
    #[serde(rename = "type")]
    pub msg_type: String,

    /// Arbitrary JSON payload
    pub data: Value,
}

impl Message {
    pub fn new(msg_type: impl Into<String>, data: Value) -> Self {
        Self {
            msg_type: msg_type.into(),
            data,
        }
    }

    /// Message without payload (`data` is an empty object)
    pub fn signal(msg_type: impl Into<String>) -> Self {
        Self::new(msg_type, Value::Object(Default::default()))
    }

    /// Render as a single-line JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.msg_type.clone())
    }
}

/// Broadcast bus shared between components
///
/// Clones share the same underlying channel.
#[derive(Clone)]
pub struct MessageBus {
    tx: broadcast::Sender<Message>,
}

impl MessageBus {
    /// Create a bus buffering up to `capacity` messages per slow subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a message, returning how many subscribers received it
    pub fn emit(&self, message: Message) -> usize {
        let msg_type = message.msg_type.clone();
        match self.tx.send(message) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("No subscribers for message {}", msg_type);
                0
            }
        }
    }

    /// Subscribe to all messages emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.tx.subscribe()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscriber_receives_emitted_message() {
        let bus = MessageBus::default();
        let mut rx = bus.subscribe();

        let delivered = bus.emit(Message::new(CONFIGURATION_UPDATED, json!({"lang": "en-us"})));
        assert_eq!(delivered, 1);

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.msg_type, CONFIGURATION_UPDATED);
        assert_eq!(msg.data["lang"], "en-us");
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = MessageBus::new(4);
        assert_eq!(bus.emit(Message::signal(DEVICE_NOT_PAIRED)), 0);
    }

    #[tokio::test]
    async fn test_clones_share_channel() {
        let bus = MessageBus::default();
        let other = bus.clone();
        let mut rx = bus.subscribe();

        other.emit(Message::signal(CONFIGURATION_RELOADED));

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.msg_type, CONFIGURATION_RELOADED);
        assert_eq!(msg.data, json!({}));
    }

    #[test]
    fn test_message_json_uses_type_key() {
        let msg = Message::signal(DEVICE_NOT_PAIRED);
        assert_eq!(msg.to_json(), r#"{"type":"device.not.paired","data":{}}"#);
    }
}
