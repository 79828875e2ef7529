use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::{LedgerEvent, Room};

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for committed ledger changes, one channel per room.
pub struct NotifyHub {
    channels: DashMap<Room, broadcast::Sender<LedgerEvent>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to changes for a room. Creates the channel if needed.
    pub fn subscribe(&self, room: Room) -> broadcast::Receiver<LedgerEvent> {
        let sender = self
            .channels
            .entry(room)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send a notification to the event's room. No-op if nobody is listening.
    pub fn send(&self, event: &LedgerEvent) {
        if let Some(sender) = self.channels.get(&event.room()) {
            let _ = sender.send(event.clone());
        }
    }

    /// Drop a room's channel; current subscribers see the stream close.
    pub fn remove(&self, room: &Room) {
        self.channels.remove(room);
    }
}
