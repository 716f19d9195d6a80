/*
[INPUT]:  Socket URL, reconnect/retry timings, subscription manager
[OUTPUT]: Live tokio-tungstenite connection feeding open/close/message events to the manager
[POS]:    WebSocket layer - reconnecting transport and connection loop
[UPDATE]: When changing reconnect backoff, send retry or frame handling
*/

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{ReconnectConfig, SendRetryConfig};
use crate::error::{AqueductError, Result};
use crate::ws::subscriptions::SubscriptionManager;
use crate::ws::transport::Transport;

const FRAME_LOG_LIMIT: usize = 10;

static FRAME_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

type Outbound = Arc<Mutex<Option<mpsc::UnboundedSender<WsMessage>>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected { retry_count: u32 },
}

/// Outbound half of the socket.
///
/// Frames are queued to the live writer when there is one. Otherwise they
/// are retried on a fixed interval and abandoned after the retry budget.
#[derive(Debug, Clone)]
pub struct SocketTransport {
    outbound: Outbound,
    retry: SendRetryConfig,
}

impl SocketTransport {
    pub fn new(retry: SendRetryConfig) -> Self {
        Self {
            outbound: Arc::new(Mutex::new(None)),
            retry,
        }
    }

    /// Whether a connection writer is currently installed
    pub fn is_writable(&self) -> bool {
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    fn install(&self, tx: mpsc::UnboundedSender<WsMessage>) {
        *self.outbound.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
    }

    fn clear(&self) {
        *self.outbound.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn try_send(outbound: &Outbound, frame: &str) -> bool {
        let guard = outbound.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(tx) => tx.send(WsMessage::Text(frame.to_owned().into())).is_ok(),
            None => false,
        }
    }
}

impl Transport for SocketTransport {
    fn send(&self, frame: String) -> Result<()> {
        if Self::try_send(&self.outbound, &frame) {
            log_frame_sent(&frame);
            return Ok(());
        }

        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            AqueductError::WebSocket("no tokio runtime available to retry send".to_string())
        })?;
        debug!(%frame, "socket not writable; retrying send");
        handle.spawn(retry_send(self.outbound.clone(), self.retry.clone(), frame));
        Ok(())
    }
}

async fn retry_send(outbound: Outbound, retry: SendRetryConfig, frame: String) {
    for attempt in 1..=retry.max_attempts {
        tokio::time::sleep(retry.interval).await;
        if SocketTransport::try_send(&outbound, &frame) {
            debug!(attempt, %frame, "deferred frame sent");
            return;
        }
    }

    let err = AqueductError::SendTransientFailure {
        attempts: retry.max_attempts,
    };
    warn!(error = %err, %frame, "failed to send");
}

/// Reconnecting socket connection driving a [`SubscriptionManager`]
#[derive(Debug)]
pub struct AqueductSocket {
    shutdown: CancellationToken,
    state: watch::Receiver<ConnectionState>,
    worker: Option<JoinHandle<()>>,
}

impl AqueductSocket {
    /// Start the connection loop on the current tokio runtime
    pub fn spawn(
        url: Url,
        reconnect: ReconnectConfig,
        transport: SocketTransport,
        manager: SubscriptionManager,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            AqueductError::WebSocket("socket requires a tokio runtime".to_string())
        })?;

        let shutdown = CancellationToken::new();
        let (state_tx, state) = watch::channel(ConnectionState::Disconnected { retry_count: 0 });
        let worker = SocketWorker {
            url,
            reconnect,
            transport,
            manager,
            state: state_tx,
            shutdown: shutdown.clone(),
        };

        Ok(Self {
            shutdown,
            state,
            worker: Some(runtime.spawn(worker.run())),
        })
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Stop reconnecting and close the current connection
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Shut down and wait for the connection loop to exit
    pub async fn close(mut self) {
        self.shutdown.cancel();
        if let Some(worker) = self.worker.take()
            && let Err(err) = worker.await
        {
            warn!(error = %err, "socket worker ended abnormally");
        }
    }
}

impl Drop for AqueductSocket {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamExit {
    Disconnected,
    Shutdown,
}

struct SocketWorker {
    url: Url,
    reconnect: ReconnectConfig,
    transport: SocketTransport,
    manager: SubscriptionManager,
    state: watch::Sender<ConnectionState>,
    shutdown: CancellationToken,
}

impl SocketWorker {
    async fn run(self) {
        let mut retry_count: u32 = 0;

        'run: loop {
            let _ = self.state.send(ConnectionState::Connecting);
            info!(url = %self.url, "connecting to relayer socket");

            let connected = tokio::select! {
                _ = self.shutdown.cancelled() => break 'run,
                result = connect_async(self.url.as_str()) => result,
            };

            match connected {
                Ok((stream, _response)) => {
                    retry_count = 0;
                    info!(url = %self.url, "relayer socket connected");
                    if self.stream_loop(stream).await == StreamExit::Shutdown {
                        break 'run;
                    }
                    warn!("relayer socket disconnected");
                }
                Err(err) => {
                    let err = AqueductError::from(err);
                    warn!(
                        retry_count,
                        retryable = err.is_retryable(),
                        error = %err,
                        "relayer socket connect failed"
                    );
                }
            }

            let backoff = self.reconnect.backoff(retry_count);
            retry_count = retry_count.saturating_add(1);
            let _ = self.state.send(ConnectionState::Disconnected { retry_count });
            debug!(?backoff, retry_count, "waiting before reconnect");

            tokio::select! {
                _ = self.shutdown.cancelled() => break 'run,
                _ = tokio::time::sleep(backoff) => {}
            }
        }

        self.transport.clear();
        let _ = self.state.send(ConnectionState::Disconnected { retry_count });
        info!("relayer socket shut down");
    }

    async fn stream_loop(&self, stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> StreamExit {
        let (mut write, mut read) = stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

        self.transport.install(outbound_tx);
        let _ = self.state.send(ConnectionState::Connected);
        self.manager.on_transport_open();

        let exit = loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    let _ = write.send(WsMessage::Close(None)).await;
                    break StreamExit::Shutdown;
                }
                outbound = outbound_rx.recv() => {
                    match outbound {
                        Some(message) => {
                            if let Err(err) = write.send(message).await {
                                let err = AqueductError::from(err);
                                warn!(error = %err, "socket write failed");
                                break StreamExit::Disconnected;
                            }
                        }
                        None => break StreamExit::Disconnected,
                    }
                }
                incoming = read.next() => {
                    match incoming {
                        Some(Ok(WsMessage::Text(text))) => {
                            self.manager.dispatch(text.as_str());
                        }
                        Some(Ok(WsMessage::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                            Ok(text) => {
                                self.manager.dispatch(text);
                            }
                            Err(_) => debug!(bytes = bytes.len(), "dropping non-utf8 binary frame"),
                        },
                        Some(Ok(WsMessage::Close(frame))) => {
                            debug!(?frame, "server closed socket");
                            break StreamExit::Disconnected;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            let err = AqueductError::from(err);
                            warn!(error = %err, "socket read failed");
                            break StreamExit::Disconnected;
                        }
                        None => break StreamExit::Disconnected,
                    }
                }
            }
        };

        self.transport.clear();
        self.manager.on_transport_close();
        exit
    }
}

fn log_frame_sent(frame: &str) {
    let count = FRAME_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < FRAME_LOG_LIMIT {
        info!(
            sample_index = count + 1,
            sample_limit = FRAME_LOG_LIMIT,
            frame,
            "ws control frame sent"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast_retry(max_attempts: u32) -> SendRetryConfig {
        SendRetryConfig {
            interval: Duration::from_millis(10),
            max_attempts,
        }
    }

    #[test]
    fn send_without_runtime_or_writer_fails() {
        let transport = SocketTransport::new(SendRetryConfig::default());
        assert!(!transport.is_writable());
        assert!(matches!(
            transport.send("sub:ticker".to_string()),
            Err(AqueductError::WebSocket(_))
        ));
    }

    #[tokio::test]
    async fn send_with_writer_queues_text_frame() {
        let transport = SocketTransport::new(SendRetryConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        transport.install(tx);
        assert!(transport.is_writable());

        transport.send("sub:ticker".to_string()).expect("send");

        match rx.recv().await {
            Some(WsMessage::Text(text)) => assert_eq!(text.as_str(), "sub:ticker"),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn deferred_send_delivers_once_writer_appears() {
        let transport = SocketTransport::new(fast_retry(20));
        transport.send("sub:ticker".to_string()).expect("deferred send");

        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::time::sleep(Duration::from_millis(30)).await;
        transport.install(tx);

        let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("retry should deliver");
        match frame {
            Some(WsMessage::Text(text)) => assert_eq!(text.as_str(), "sub:ticker"),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn deferred_send_is_abandoned_after_budget() {
        let transport = SocketTransport::new(fast_retry(2));
        transport.send("sub:ticker".to_string()).expect("deferred send");

        tokio::time::sleep(Duration::from_millis(100)).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        transport.install(tx);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }
}
