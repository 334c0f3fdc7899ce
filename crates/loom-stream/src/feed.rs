use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::live::{LiveEvent, LiveState, reduce};

type SharedSender = Arc<Mutex<Option<mpsc::UnboundedSender<LiveEvent>>>>;

/// Creates the inbound channel for one conversation's live events.
pub fn live_feed(conversation_id: impl Into<String>) -> (LiveFeedSender, LiveFeed) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let sender = LiveFeedSender {
        inner: Arc::new(Mutex::new(Some(sender))),
    };
    let feed = LiveFeed {
        receiver,
        snapshot: LiveState::idle(conversation_id),
    };
    (sender, feed)
}

#[derive(Clone)]
pub struct LiveFeedSender {
    inner: SharedSender,
}

impl LiveFeedSender {
    /// Returns `false` once the feed is closed or the receiver is gone.
    pub fn push(&self, event: LiveEvent) -> bool {
        match lock(&self.inner).as_ref() {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    /// Closes the feed for every clone of this sender. Queued events are
    /// still delivered.
    pub fn close(&self) {
        lock(&self.inner).take();
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.inner)
            .as_ref()
            .map_or(true, |sender| sender.is_closed())
    }
}

pub struct LiveFeed {
    receiver: mpsc::UnboundedReceiver<LiveEvent>,
    snapshot: LiveState,
}

impl LiveFeed {
    pub fn snapshot(&self) -> &LiveState {
        &self.snapshot
    }

    /// Waits for the next event and returns the snapshot it produces.
    pub async fn next_snapshot(&mut self) -> Option<LiveState> {
        let event = self.receiver.recv().await?;
        self.snapshot = reduce(&self.snapshot, &event);
        Some(self.snapshot.clone())
    }

    /// Applies every event already queued without waiting; returns how many
    /// were applied so a render pass can coalesce bursts of chunks.
    pub fn drain_ready(&mut self) -> usize {
        let mut applied = 0usize;
        while let Ok(event) = self.receiver.try_recv() {
            self.snapshot = reduce(&self.snapshot, &event);
            applied += 1;
        }
        applied
    }
}

fn lock(inner: &SharedSender) -> MutexGuard<'_, Option<mpsc::UnboundedSender<LiveEvent>>> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
