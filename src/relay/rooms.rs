//! Per-proto fanout rooms.
//!
//! A room is a `tokio::sync::broadcast` channel keyed by proto id. Every
//! connection scoped to a proto joins that proto's room; text frames are
//! forwarded to all members, sender included (clients drop their own echo
//! by user id). Rooms hold no history — a peer only sees what arrives
//! while it is connected.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

/// Buffered messages per room before slow receivers start lagging.
const ROOM_CAPACITY: usize = 256;

#[derive(Clone, Default)]
pub struct RoomRegistry {
    inner: Arc<Mutex<HashMap<i64, broadcast::Sender<String>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a proto's room, creating it on first use.
    pub fn join(&self, proto_id: i64) -> (broadcast::Sender<String>, broadcast::Receiver<String>) {
        let mut rooms = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let sender = rooms
            .entry(proto_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .clone();
        let receiver = sender.subscribe();
        (sender, receiver)
    }

    /// Drop a room once the last member left.
    pub fn prune(&self, proto_id: i64) {
        let mut rooms = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(sender) = rooms.get(&proto_id) {
            if sender.receiver_count() == 0 {
                rooms.remove(&proto_id);
            }
        }
    }

    pub fn room_count(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn members_of_one_room_see_each_other() {
        let rooms = RoomRegistry::new();
        let (tx_a, _rx_a) = rooms.join(3);
        let (_tx_b, mut rx_b) = rooms.join(3);

        tx_a.send("hello".to_string()).unwrap();
        assert_eq!(rx_b.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn rooms_are_isolated_by_proto() {
        let rooms = RoomRegistry::new();
        let (tx_a, _rx_a) = rooms.join(3);
        let (_tx_b, mut rx_b) = rooms.join(4);

        tx_a.send("proto 3 draft".to_string()).unwrap();
        assert!(matches!(
            rx_b.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
        assert_eq!(rooms.room_count(), 2);
    }

    #[test]
    fn prune_removes_empty_rooms_only() {
        let rooms = RoomRegistry::new();
        let (_tx_keep, _rx_keep) = rooms.join(3);
        {
            let (_tx, _rx) = rooms.join(4);
        } // proto 4 receiver dropped here
        rooms.prune(3);
        rooms.prune(4);
        assert_eq!(rooms.room_count(), 1);
    }

    #[tokio::test]
    async fn sender_receives_its_own_fanout() {
        // The relay echoes to the sender too; self-filtering is the
        // client's job.
        let rooms = RoomRegistry::new();
        let (tx, mut rx) = rooms.join(7);
        tx.send("my own draft".to_string()).unwrap();
        assert_eq!(rx.recv().await.unwrap(), "my own draft");
    }
}
