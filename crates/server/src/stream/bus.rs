use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use pulse_shared::constants::LISTENER_BUFFER_SIZE;

use super::events::ChatEvent;

pub type ListenerId = Uuid;

/// One registered consumer of a channel's events.
///
/// Sinks are heterogeneous: the production sink feeds an open stream
/// response, tests plug in recording or failing ones. Both operations are
/// best-effort; a sink that fails is skipped, never retried.
pub trait EventSink: Send + Sync {
    /// Non-blocking delivery attempt. Returns false when the frame was not
    /// accepted (consumer gone or its buffer full).
    fn push(&self, frame: &str) -> bool;
    /// Ends the consumer's stream. Idempotent.
    fn close(&self);
}

/// Sink backed by the bounded queue draining into one stream response.
struct StreamSink {
    tx: std::sync::Mutex<Option<mpsc::Sender<String>>>,
}

impl StreamSink {
    fn new(tx: mpsc::Sender<String>) -> Self {
        Self {
            tx: std::sync::Mutex::new(Some(tx)),
        }
    }
}

impl EventSink for StreamSink {
    fn push(&self, frame: &str) -> bool {
        match self.tx.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(tx) => tx.try_send(frame.to_string()).is_ok(),
                None => false,
            },
            Err(_) => false,
        }
    }

    fn close(&self) {
        if let Ok(mut guard) = self.tx.lock() {
            guard.take();
        }
    }
}

/// Process-wide channel -> listener registry.
///
/// Constructed once at startup and handed by reference to everything that
/// publishes or subscribes; tests build their own isolated instance.
pub struct EventBus {
    listeners: RwLock<HashMap<i64, HashMap<ListenerId, Arc<dyn EventSink>>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// Register an arbitrary sink for a channel.
    pub async fn add_listener(&self, channel_id: i64, sink: Arc<dyn EventSink>) -> ListenerId {
        let id = Uuid::new_v4();
        self.listeners
            .write()
            .await
            .entry(channel_id)
            .or_default()
            .insert(id, sink);
        id
    }

    /// Register a queue-backed listener and return its receiving half. The
    /// subscription deregisters itself when dropped.
    pub async fn subscribe(self: &Arc<Self>, channel_id: i64) -> Subscription {
        let (tx, rx) = mpsc::channel(LISTENER_BUFFER_SIZE);
        let id = self
            .add_listener(channel_id, Arc::new(StreamSink::new(tx)))
            .await;
        Subscription {
            id,
            channel_id,
            rx,
            bus: Arc::clone(self),
        }
    }

    /// Remove one listener. Removing an unknown listener or channel is a
    /// no-op; an empty set is dropped so the registry does not accumulate
    /// dead channel entries.
    pub async fn unsubscribe(&self, channel_id: i64, listener_id: ListenerId) {
        let mut listeners = self.listeners.write().await;
        if let Some(set) = listeners.get_mut(&channel_id) {
            set.remove(&listener_id);
            if set.is_empty() {
                listeners.remove(&channel_id);
            }
        }
    }

    /// Fan an event out to every listener of `channel_id`.
    ///
    /// The frame is rendered once. Delivery per listener is a single
    /// non-blocking push; a listener that cannot take the frame is skipped
    /// and the remaining listeners still receive it. Nothing propagates to
    /// the caller: the write that triggered the publish has already been
    /// committed.
    pub async fn publish(&self, channel_id: i64, event: &ChatEvent) {
        let data = match serde_json::to_string(event) {
            Ok(d) => d,
            Err(_) => return,
        };
        let frame = sse_frame(event.name(), &data);

        let listeners = self.listeners.read().await;
        if let Some(set) = listeners.get(&channel_id) {
            for (listener_id, sink) in set.iter() {
                if !sink.push(&frame) {
                    tracing::debug!(channel_id, %listener_id, "listener did not accept frame");
                }
            }
        }
    }

    /// Close every listener of a channel and drop its entry.
    pub async fn close_channel(&self, channel_id: i64) {
        let mut listeners = self.listeners.write().await;
        if let Some(set) = listeners.remove(&channel_id) {
            for sink in set.values() {
                sink.close();
            }
        }
    }

    pub async fn listener_count(&self, channel_id: i64) -> usize {
        self.listeners
            .read()
            .await
            .get(&channel_id)
            .map(|set| set.len())
            .unwrap_or(0)
    }

    /// Number of channels with at least one listener.
    pub async fn channel_count(&self) -> usize {
        self.listeners.read().await.len()
    }
}

/// Render one `text/event-stream` block.
pub fn sse_frame(event: &str, data: &str) -> String {
    format!("event: {}\ndata: {}\n\n", event, data)
}

/// Receiving half of one bus registration. Yields rendered frames; dropping
/// it removes the listener from the registry.
pub struct Subscription {
    id: ListenerId,
    channel_id: i64,
    rx: mpsc::Receiver<String>,
    bus: Arc<EventBus>,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let bus = Arc::clone(&self.bus);
        let channel_id = self.channel_id;
        let id = self.id;
        tokio::spawn(async move {
            bus.unsubscribe(channel_id, id).await;
        });
    }
}
