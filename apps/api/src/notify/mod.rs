//! Push notifications over WebSocket.
//!
//! `NotificationHub` is the registry of live connections, keyed by user.
//! Delivery is best-effort and at-most-once: nothing is queued for users
//! without a live connection and nothing is replayed on reconnect.

pub mod handlers;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;
use uuid::Uuid;

use crate::models::message::Message;

pub type ConnectionId = u64;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum Event {
    NewMessage(Message),
    MessagesRead { message_ids: Vec<Uuid> },
}

#[derive(Default)]
struct Registry {
    next_id: ConnectionId,
    connections: HashMap<Uuid, HashMap<ConnectionId, UnboundedSender<Event>>>,
}

#[derive(Clone, Default)]
pub struct NotificationHub {
    registry: Arc<Mutex<Registry>>,
}

impl NotificationHub {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a new connection for `user_id` and returns the receiving
    /// end of its event channel.
    pub fn connect(&self, user_id: Uuid) -> (ConnectionId, UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.registry();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.connections.entry(user_id).or_default().insert(id, tx);
        debug!("WebSocket connection {id} registered for user {user_id}");
        (id, rx)
    }

    pub fn disconnect(&self, user_id: Uuid, id: ConnectionId) {
        let mut registry = self.registry();
        if let Some(conns) = registry.connections.get_mut(&user_id) {
            conns.remove(&id);
            if conns.is_empty() {
                registry.connections.remove(&user_id);
            }
        }
        debug!("WebSocket connection {id} removed for user {user_id}");
    }

    /// Delivers `event` to every live connection of `user_id`; returns how
    /// many accepted it. A closed connection is dropped from the registry.
    pub fn send(&self, user_id: Uuid, event: &Event) -> usize {
        let mut registry = self.registry();
        let Some(conns) = registry.connections.get_mut(&user_id) else {
            return 0;
        };
        conns.retain(|id, tx| {
            let open = tx.send(event.clone()).is_ok();
            if !open {
                debug!("Dropping closed WebSocket connection {id} for user {user_id}");
            }
            open
        });
        let delivered = conns.len();
        if conns.is_empty() {
            registry.connections.remove(&user_id);
        }
        delivered
    }

    pub fn connection_count(&self, user_id: Uuid) -> usize {
        self.registry()
            .connections
            .get(&user_id)
            .map_or(0, HashMap::len)
    }
}
