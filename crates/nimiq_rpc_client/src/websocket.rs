//! Persistent WebSocket transport.
//!
//! Outgoing calls are correlated to asynchronous replies by request
//! identifier, so multiple calls may be outstanding at once and replies may
//! arrive in any order. Unsolicited server pushes are routed through the
//! subscription registry to their handlers.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use futures::{stream::SplitStream, SinkExt, StreamExt};
use tokio::{
    net::TcpStream,
    sync::{mpsc, oneshot},
};
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};
use url::Url;

use crate::{
    client::RpcClientError,
    jsonrpc,
    subscription::{NotificationHandler, SubscriptionRegistry},
};

/// How long a WebSocket call waits for its reply before failing with
/// [`RpcClientError::Timeout`].
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

type PendingSender = oneshot::Sender<Result<serde_json::Value, jsonrpc::Error>>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

pub(crate) struct WsConnection {
    inner: Arc<Inner>,
}

struct Inner {
    frame_tx: mpsc::UnboundedSender<WsMessage>,
    /// Replies are matched against this table by id. At most one slot
    /// exists per id; removing and resolving a slot is a single step.
    pending: Mutex<HashMap<u64, PendingSender>>,
    subscriptions: SubscriptionRegistry,
    next_id: AtomicU64,
    response_timeout: Duration,
}

/// Removes the pending slot if the owning call is cancelled or errors out
/// before its reply arrives. Resolution removes the slot first, making the
/// removal here a no-op on the happy path.
struct PendingGuard<'a> {
    inner: &'a Inner,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.inner.lock_pending().remove(&self.id);
    }
}

impl WsConnection {
    pub async fn connect(url: Url, response_timeout: Duration) -> Result<Self, RpcClientError> {
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(RpcClientError::WebSocket)?;
        let (mut sink, stream) = stream.split();

        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<WsMessage>();
        tokio::spawn(async move {
            while let Some(frame) = frame_rx.recv().await {
                if sink.send(frame).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let inner = Arc::new(Inner {
            frame_tx,
            pending: Mutex::new(HashMap::new()),
            subscriptions: SubscriptionRegistry::default(),
            next_id: AtomicU64::new(1),
            response_timeout,
        });
        tokio::spawn(read_loop(stream, Arc::clone(&inner)));

        Ok(Self { inner })
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub async fn call(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, RpcClientError> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let request = jsonrpc::Request {
            version: jsonrpc::Version::V2_0,
            method,
            params,
            id,
        };
        let frame = serde_json::to_string(&request).map_err(RpcClientError::InvalidJsonRequest)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.inner.lock_pending().insert(id, reply_tx);
        let _guard = PendingGuard {
            inner: &self.inner,
            id,
        };

        if self.inner.frame_tx.send(WsMessage::Text(frame)).is_err() {
            return Err(RpcClientError::ConnectionClosed);
        }

        let reply = match tokio::time::timeout(self.inner.response_timeout, reply_rx).await {
            Ok(Ok(reply)) => reply,
            // The read loop tore the connection down and dropped the slot.
            Ok(Err(_closed)) => return Err(RpcClientError::ConnectionClosed),
            Err(_elapsed) => {
                return Err(RpcClientError::Timeout {
                    method: method.to_owned(),
                })
            }
        };

        reply.map_err(RpcClientError::JsonRpcError)
    }

    /// Registers `handler` under `method` and issues the subscribe call.
    /// The handler is stored before the call goes out, so a push racing the
    /// confirmation still finds its entry; it only becomes eligible for
    /// dispatch once the server-assigned subscription id is stored.
    pub async fn subscribe(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
        handler: NotificationHandler,
    ) -> Result<(), RpcClientError> {
        self.inner.subscriptions.insert_pending(method, handler);

        let result = match self.call(method, params).await {
            Ok(result) => result,
            Err(error) => {
                self.inner.subscriptions.remove(method);
                return Err(error);
            }
        };

        let server_id = match serde_json::from_value::<u64>(result.clone()) {
            Ok(server_id) => server_id,
            Err(error) => {
                self.inner.subscriptions.remove(method);
                return Err(RpcClientError::InvalidResponse {
                    response: result.to_string(),
                    expected_type: "subscription id (u64)",
                    error,
                });
            }
        };

        self.inner.subscriptions.confirm(method, server_id);
        Ok(())
    }

    pub fn unsubscribe(&self, method: &str) {
        self.inner.subscriptions.remove(method);
    }

    pub fn close(&self) {
        let _ = self.inner.frame_tx.send(WsMessage::Close(None));
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        // The read loop holds its own `Arc<Inner>`, so without the close
        // handshake it would keep the socket and both tasks alive until
        // the server hangs up.
        self.close();
    }
}

impl Inner {
    fn lock_pending(&self) -> MutexGuard<'_, HashMap<u64, PendingSender>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle_frame(&self, frame: &str) {
        match serde_json::from_str::<jsonrpc::InboundMessage>(frame) {
            Ok(jsonrpc::InboundMessage::Reply(reply)) => self.resolve(reply),
            Ok(jsonrpc::InboundMessage::Notification(notification)) => self.dispatch(notification),
            Err(error) => log::error!("could not decode inbound frame: {error}"),
        }
    }

    fn resolve(&self, reply: jsonrpc::Response<serde_json::Value>) {
        let jsonrpc::Id::Num(id) = reply.id else {
            // This client only ever sends numeric identifiers.
            log::debug!("dropping reply with non-numeric id");
            return;
        };
        let Some(sender) = self.lock_pending().remove(&id) else {
            // Late reply for a call that timed out or was cancelled.
            log::debug!("dropping reply for unknown call id {id}");
            return;
        };
        let _ = sender.send(reply.data.into_result());
    }

    fn dispatch(&self, notification: jsonrpc::Notification) {
        let Some(server_id) = notification.subscription() else {
            log::debug!(
                "dropping notification for {} without subscription id",
                notification.method
            );
            return;
        };
        let Some(handler) = self
            .subscriptions
            .handler_for(&notification.method, server_id)
        else {
            // Unknown method or stale subscription id; unknown pushes are
            // benign (e.g. leftovers after an unsubscribe).
            log::debug!("dropping unmatched notification for {}", notification.method);
            return;
        };

        let method = notification.method.clone();
        let payload = notification.into_payload();
        // Handlers run on their own task; a slow or failing callback never
        // stalls the read loop or other subscriptions.
        tokio::spawn(async move {
            if let Err(error) = handler(payload).await {
                log::error!("subscription callback for {method} failed: {error}");
            }
        });
    }

    /// Fails every outstanding call and forgets all subscriptions. Dropping
    /// a pending sender resolves the awaiting caller with
    /// [`RpcClientError::ConnectionClosed`].
    fn teardown(&self) {
        self.lock_pending().clear();
        self.subscriptions.clear();
    }
}

async fn read_loop(mut stream: WsStream, inner: Arc<Inner>) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Text(frame)) => inner.handle_frame(&frame),
            Ok(WsMessage::Ping(payload)) => {
                let _ = inner.frame_tx.send(WsMessage::Pong(payload));
            }
            Ok(WsMessage::Pong(_) | WsMessage::Binary(_) | WsMessage::Frame(_)) => {}
            Ok(WsMessage::Close(_)) => break,
            Err(error) => {
                log::debug!("websocket read failed: {error}");
                break;
            }
        }
    }
    inner.teardown();
}
