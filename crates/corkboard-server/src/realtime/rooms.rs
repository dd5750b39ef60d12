// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;

/// Registry of per-room broadcast channels.
///
/// Each room is one `tokio::sync::broadcast` channel, which is what gives
/// the per-room ordering guarantee: subscribers observe frames in send
/// order. Channels are created lazily on first touch and never torn down —
/// membership is re-checked on every join, not cached, so an idle channel
/// holds no authority.
pub struct Rooms {
    channels: RwLock<HashMap<String, broadcast::Sender<Arc<str>>>>,
    buffer: usize,
}

impl Rooms {
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            buffer: buffer.max(8),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, broadcast::Sender<Arc<str>>>> {
        match self.channels.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, broadcast::Sender<Arc<str>>>> {
        match self.channels.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn sender(&self, room: &str) -> broadcast::Sender<Arc<str>> {
        if let Some(sender) = self.read().get(room) {
            return sender.clone();
        }
        let mut channels = self.write();
        channels
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer).0)
            .clone()
    }

    pub fn subscribe(&self, room: &str) -> broadcast::Receiver<Arc<str>> {
        self.sender(room).subscribe()
    }

    /// Deliver a frame to the room's current subscribers; returns how many
    /// received it. A room nobody joined swallows the frame, which is
    /// correct — events carry no authority and are never replayed.
    pub fn send(&self, room: &str, frame: Arc<str>) -> usize {
        self.sender(room).send(frame).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_arrive_in_emit_order_for_every_subscriber() {
        let rooms = Rooms::new(16);
        let mut first = rooms.subscribe("project_p1");
        let mut second = rooms.subscribe("project_p1");

        rooms.send("project_p1", "one".into());
        rooms.send("project_p1", "two".into());
        rooms.send("project_p1", "three".into());

        for receiver in [&mut first, &mut second] {
            let mut seen = Vec::new();
            for _ in 0..3 {
                seen.push(receiver.recv().await.expect("frame"));
            }
            assert_eq!(
                seen.iter().map(|s| s.as_ref()).collect::<Vec<_>>(),
                vec!["one", "two", "three"]
            );
        }
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let rooms = Rooms::new(16);
        let mut task_room = rooms.subscribe("task_t1");

        rooms.send("project_p1", "elsewhere".into());
        rooms.send("task_t1", "here".into());

        assert_eq!(task_room.recv().await.expect("frame").as_ref(), "here");
        assert!(task_room.try_recv().is_err());
    }

    #[test]
    fn sending_to_an_empty_room_reports_zero_receivers() {
        let rooms = Rooms::new(16);
        assert_eq!(rooms.send("workspace_w1", "lost".into()), 0);
    }
}
