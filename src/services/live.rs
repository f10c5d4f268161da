//! Registry of connected live-update clients.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

use crate::constants::live::{CLIENT_BUFFER, SEND_TIMEOUT};

/// Outbound half of one client connection.
pub type ClientSink = mpsc::Sender<String>;

#[derive(Clone)]
pub struct LiveUpdates {
    clients: Arc<RwLock<HashMap<String, ClientSink>>>,
    send_timeout: Duration,
}

impl Default for LiveUpdates {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveUpdates {
    #[must_use]
    pub fn new() -> Self {
        Self::with_send_timeout(SEND_TIMEOUT)
    }

    #[must_use]
    pub fn with_send_timeout(send_timeout: Duration) -> Self {
        Self {
            clients: Arc::new(RwLock::new(HashMap::new())),
            send_timeout,
        }
    }

    /// Channel sized for one client; the receiver feeds its socket writer.
    #[must_use]
    pub fn channel() -> (ClientSink, mpsc::Receiver<String>) {
        mpsc::channel(CLIENT_BUFFER)
    }

    /// Registers `sink` under `client_id`, replacing any previous connection.
    pub async fn connect(&self, client_id: &str, sink: ClientSink) {
        let replaced = self
            .clients
            .write()
            .await
            .insert(client_id.to_string(), sink)
            .is_some();
        debug!(client_id, replaced, "Live client connected");
    }

    pub async fn disconnect(&self, client_id: &str) {
        self.clients.write().await.remove(client_id);
        debug!(client_id, "Live client disconnected");
    }

    /// Removes the entry only if it is still `sink`, so a closing socket
    /// cannot evict the connection that replaced it.
    pub async fn disconnect_sink(&self, client_id: &str, sink: &ClientSink) {
        let mut clients = self.clients.write().await;
        if clients
            .get(client_id)
            .is_some_and(|current| current.same_channel(sink))
        {
            clients.remove(client_id);
            debug!(client_id, "Live client disconnected");
        }
    }

    /// Delivers to one client; unknown ids are ignored.
    pub async fn send_personal(&self, client_id: &str, text: &str) {
        let sink = self.clients.read().await.get(client_id).cloned();
        if let Some(sink) = sink
            && !self.deliver(client_id, &sink, text.to_string()).await
        {
            self.disconnect_sink(client_id, &sink).await;
        }
    }

    /// Sends `payload` to every client concurrently. Clients that are closed or
    /// too slow are dropped; the rest still receive it.
    pub async fn broadcast(&self, payload: &str) -> usize {
        let targets: Vec<(String, ClientSink)> = self
            .clients
            .read()
            .await
            .iter()
            .map(|(id, sink)| (id.clone(), sink.clone()))
            .collect();

        let outcomes = join_all(targets.iter().map(|(client_id, sink)| {
            self.deliver(client_id, sink, payload.to_string())
        }))
        .await;

        let mut delivered = 0;
        for ((client_id, sink), ok) in targets.iter().zip(outcomes) {
            if ok {
                delivered += 1;
            } else {
                self.disconnect_sink(client_id, sink).await;
            }
        }

        metrics::counter!("live_updates_sent_total").increment(delivered as u64);
        delivered
    }

    pub async fn connected(&self) -> usize {
        self.clients.read().await.len()
    }

    async fn deliver(&self, client_id: &str, sink: &ClientSink, text: String) -> bool {
        match sink.send_timeout(text, self.send_timeout).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    event = "live_update_failed",
                    client_id,
                    error = %e,
                    "Dropping live client after failed send"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_skips_failed_clients() {
        let hub = LiveUpdates::with_send_timeout(Duration::from_millis(20));

        let (a_tx, mut a_rx) = LiveUpdates::channel();
        let (b_tx, b_rx) = LiveUpdates::channel();
        let (c_tx, mut c_rx) = LiveUpdates::channel();
        hub.connect("a", a_tx).await;
        hub.connect("b", b_tx).await;
        hub.connect("c", c_tx).await;
        drop(b_rx);

        let delivered = hub.broadcast("hello").await;

        assert_eq!(delivered, 2);
        assert_eq!(a_rx.recv().await.as_deref(), Some("hello"));
        assert_eq!(c_rx.recv().await.as_deref(), Some("hello"));
        assert_eq!(hub.connected().await, 2);
    }

    #[tokio::test]
    async fn slow_client_times_out_without_blocking_others() {
        let hub = LiveUpdates::with_send_timeout(Duration::from_millis(20));

        let (slow_tx, _slow_rx) = mpsc::channel(1);
        slow_tx.send("backlog".to_string()).await.unwrap();
        let (fast_tx, mut fast_rx) = LiveUpdates::channel();
        hub.connect("slow", slow_tx).await;
        hub.connect("fast", fast_tx).await;

        assert_eq!(hub.broadcast("update").await, 1);
        assert_eq!(fast_rx.recv().await.as_deref(), Some("update"));
        assert_eq!(hub.connected().await, 1);
    }

    #[tokio::test]
    async fn connect_overwrites_and_personal_targets_one() {
        let hub = LiveUpdates::new();
        let (old_tx, mut old_rx) = LiveUpdates::channel();
        let (new_tx, mut new_rx) = LiveUpdates::channel();

        hub.connect("same", old_tx.clone()).await;
        hub.connect("same", new_tx).await;
        hub.send_personal("same", "ping").await;
        hub.send_personal("missing", "ignored").await;

        assert_eq!(new_rx.recv().await.as_deref(), Some("ping"));
        assert!(old_rx.try_recv().is_err());

        hub.disconnect_sink("same", &old_tx).await;
        assert_eq!(hub.connected().await, 1);

        hub.disconnect("same").await;
        assert_eq!(hub.connected().await, 0);
    }
}
