//! Long-lived `/api/events` connection with fixed-delay reconnect

use crate::events::{decode_event, ServerEvent};
use crate::sse::SseDecoder;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What the listener reports to the UI thread
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerMessage {
    Connected,
    Event(ServerEvent),
    Malformed { payload: String, error: String },
    Disconnected { reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("connect failed: {0}")]
    Connect(#[source] reqwest::Error),
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("stream error: {0}")]
    Stream(#[source] reqwest::Error),
    #[error("server closed the stream")]
    Closed,
}

pub struct EventListener {
    http: reqwest::Client,
    url: String,
    reconnect_delay: Duration,
    tx: UnboundedSender<ListenerMessage>,
    wake: Arc<dyn Fn() + Send + Sync>,
}

impl EventListener {
    pub fn new(
        http: reqwest::Client,
        url: String,
        reconnect_delay: Duration,
        tx: UnboundedSender<ListenerMessage>,
        wake: Arc<dyn Fn() + Send + Sync>,
    ) -> Self {
        Self { http, url, reconnect_delay, tx, wake }
    }

    /// Run until `cancel` fires or the receiving side goes away
    pub async fn run(self, cancel: CancellationToken) {
        info!(url = %self.url, "Event listener starting");
        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.connect_once() => result,
            };
            let error = match result {
                Ok(()) => break,
                Err(e) => e,
            };

            warn!(error = %error, delay_ms = self.reconnect_delay.as_millis() as u64, "Event stream lost, reconnecting");
            if !self.send(ListenerMessage::Disconnected { reason: error.to_string() }) {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
        info!("Event listener stopped");
    }

    /// One connection. `Ok` means the UI is gone and the listener should stop.
    async fn connect_once(&self) -> Result<(), ListenerError> {
        let response = self
            .http
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(ListenerError::Connect)?;
        if !response.status().is_success() {
            return Err(ListenerError::Status(response.status().as_u16()));
        }

        info!("Event stream connected");
        if !self.send(ListenerMessage::Connected) {
            return Ok(());
        }

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(ListenerError::Stream)?;
            for payload in decoder.push(&chunk) {
                let message = match decode_event(&payload) {
                    Ok(event) => {
                        debug!(kind = event.kind(), "Event received");
                        ListenerMessage::Event(event)
                    }
                    Err(e) => {
                        warn!(error = %e, payload = %payload, "Malformed event");
                        ListenerMessage::Malformed { payload, error: e.to_string() }
                    }
                };
                if !self.send(message) {
                    return Ok(());
                }
            }
        }
        Err(ListenerError::Closed)
    }

    fn send(&self, message: ListenerMessage) -> bool {
        if self.tx.send(message).is_err() {
            return false;
        }
        (self.wake)();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DownloadStarted;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
    use tokio::time::timeout;

    const SSE_HEAD: &str =
        "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n";

    /// Each accepted connection gets the next script; the stream then closes
    async fn sse_server(scripts: Vec<String>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let count = connections.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let n = count.fetch_add(1, Ordering::SeqCst);
                let _ = crate::api::test_server::read_request(&mut stream).await;
                let script = scripts.get(n).cloned().unwrap_or_default();
                let _ = stream.write_all(script.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        (format!("http://{}/api/events", addr), connections)
    }

    fn listener(url: String, delay: Duration) -> (EventListener, UnboundedReceiver<ListenerMessage>, Arc<AtomicUsize>) {
        let (tx, rx) = unbounded_channel();
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        let wake = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (EventListener::new(reqwest::Client::new(), url, delay, tx, wake), rx, wakes)
    }

    async fn next(rx: &mut UnboundedReceiver<ListenerMessage>) -> ListenerMessage {
        timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn dispatches_events_and_reconnects_after_close() {
        let first = format!(
            "{}data: {{\"type\":\"connected\"}}\n\n\
             data: {{\"type\":\"download_started\",\"id\":\"dl_1\"}}\n\n\
             data: not-json\n\n\
             : keepalive\n\n\
             data: {{\"type\":\"future_thing\"}}\n\n",
            SSE_HEAD
        );
        let second = format!("{}data: {{\"type\":\"heartbeat\"}}\n\n", SSE_HEAD);
        let (url, connections) = sse_server(vec![first, second]).await;
        let (listener, mut rx, wakes) = listener(url, Duration::from_millis(50));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(listener.run(cancel.clone()));

        assert_eq!(next(&mut rx).await, ListenerMessage::Connected);
        assert_eq!(next(&mut rx).await, ListenerMessage::Event(ServerEvent::Connected));
        assert_eq!(
            next(&mut rx).await,
            ListenerMessage::Event(ServerEvent::Started(DownloadStarted { id: "dl_1".into(), metadata: None }))
        );
        assert!(matches!(next(&mut rx).await, ListenerMessage::Malformed { payload, .. } if payload == "not-json"));
        assert_eq!(next(&mut rx).await, ListenerMessage::Event(ServerEvent::Unknown("future_thing".into())));
        assert!(matches!(next(&mut rx).await, ListenerMessage::Disconnected { .. }));

        assert_eq!(next(&mut rx).await, ListenerMessage::Connected);
        assert_eq!(next(&mut rx).await, ListenerMessage::Event(ServerEvent::Heartbeat));
        assert!(connections.load(Ordering::SeqCst) >= 2);
        assert!(wakes.load(Ordering::SeqCst) >= 7);

        cancel.cancel();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn reconnect_waits_the_fixed_delay_and_connects_once() {
        let delay = Duration::from_millis(300);
        let listener_socket = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/events", listener_socket.local_addr().unwrap());
        let connections = Arc::new(AtomicUsize::new(0));
        let first_closed = Arc::new(std::sync::Mutex::new(None));
        let second_accepted = Arc::new(std::sync::Mutex::new(None));
        {
            let connections = connections.clone();
            let first_closed = first_closed.clone();
            let second_accepted = second_accepted.clone();
            tokio::spawn(async move {
                while let Ok((mut stream, _)) = listener_socket.accept().await {
                    let n = connections.fetch_add(1, Ordering::SeqCst);
                    if n == 1 {
                        *second_accepted.lock().unwrap() = Some(std::time::Instant::now());
                    }
                    let _ = crate::api::test_server::read_request(&mut stream).await;
                    if n == 0 {
                        let _ = stream.write_all(SSE_HEAD.as_bytes()).await;
                        *first_closed.lock().unwrap() = Some(std::time::Instant::now());
                        let _ = stream.shutdown().await;
                    } else {
                        let body = format!("{}data: {{\"type\":\"heartbeat\"}}\n\n", SSE_HEAD);
                        let _ = stream.write_all(body.as_bytes()).await;
                        // hold the stream open
                        tokio::spawn(async move {
                            tokio::time::sleep(Duration::from_secs(30)).await;
                            drop(stream);
                        });
                    }
                }
            });
        }

        let (listener, mut rx, _) = listener(url, delay);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(listener.run(cancel.clone()));

        assert_eq!(next(&mut rx).await, ListenerMessage::Connected);
        assert!(matches!(next(&mut rx).await, ListenerMessage::Disconnected { .. }));
        assert_eq!(connections.load(Ordering::SeqCst), 1);

        assert_eq!(next(&mut rx).await, ListenerMessage::Connected);
        assert_eq!(next(&mut rx).await, ListenerMessage::Event(ServerEvent::Heartbeat));
        let closed = first_closed.lock().unwrap().unwrap();
        let reopened = second_accepted.lock().unwrap().unwrap();
        assert!(reopened.duration_since(closed) >= delay);

        // a healthy stream is not reopened
        tokio::time::sleep(delay * 3).await;
        assert_eq!(connections.load(Ordering::SeqCst), 2);
        assert!(rx.try_recv().is_err());

        cancel.cancel();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn error_status_counts_as_disconnect() {
        let script = "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string();
        let (url, _) = sse_server(vec![script]).await;
        let (listener, mut rx, _) = listener(url, Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(listener.run(cancel.clone()));

        match next(&mut rx).await {
            ListenerMessage::Disconnected { reason } => assert!(reason.contains("503")),
            other => panic!("unexpected {:?}", other),
        }

        // cancellation interrupts the reconnect wait
        cancel.cancel();
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn stops_when_receiver_is_dropped() {
        let script = format!("{}data: {{\"type\":\"heartbeat\"}}\n\n", SSE_HEAD);
        let (url, _) = sse_server(vec![script]).await;
        let (listener, rx, _) = listener(url, Duration::from_millis(10));
        drop(rx);
        let handle = tokio::spawn(listener.run(CancellationToken::new()));
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }
}
