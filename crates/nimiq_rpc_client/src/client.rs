//! Transport-erased RPC client.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    http::HttpTransport, jsonrpc, subscription::NotificationHandler, websocket::WsConnection,
    DEFAULT_RESPONSE_TIMEOUT,
};

/// Specialized error types
#[derive(Debug, thiserror::Error)]
pub enum RpcClientError {
    /// The message could not be sent to the remote node
    #[error(transparent)]
    FailedToSend(reqwest::Error),

    /// The remote node failed to reply with the body of the response
    #[error("The response text was corrupted: {0}.")]
    CorruptedResponse(reqwest::Error),

    /// The server returned an error status code.
    #[error("The HTTP server returned error status code: {0}")]
    HttpStatus(reqwest::Error),

    /// The request cannot be serialized as JSON.
    #[error(transparent)]
    InvalidJsonRequest(serde_json::Error),

    /// The server returned an invalid JSON-RPC response.
    #[error("Response '{response}' failed to parse with expected type '{expected_type}', due to error: '{error}'")]
    InvalidResponse {
        /// The response text
        response: String,
        /// The expected type of the response
        expected_type: &'static str,
        /// The parse error
        error: serde_json::Error,
    },

    /// Invalid URL format
    #[error(transparent)]
    InvalidUrl(#[from] url::ParseError),

    /// The URL scheme is not one of `http`, `https`, `ws` or `wss`.
    #[error("Invalid scheme: {0}")]
    UnsupportedScheme(String),

    /// The JSON-RPC server returned an error.
    #[error(transparent)]
    JsonRpcError(#[from] jsonrpc::Error),

    /// The WebSocket connection failed.
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The connection closed while a call was outstanding.
    #[error("The connection closed while the call was outstanding")]
    ConnectionClosed,

    /// No reply arrived within the configured response timeout.
    #[error("No reply to '{method}' arrived within the response timeout")]
    Timeout {
        /// The method of the timed-out call
        method: String,
    },

    /// The caller subscribed over a transport without server push.
    #[error("Protocol '{scheme}' doesn't support RPC subscriptions")]
    SubscriptionsUnsupported {
        /// The scheme of the connection URL
        scheme: String,
    },
}

/// Basic Auth credentials for the HTTP transport.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub(crate) username: String,
    pub(crate) password: String,
}

impl Credentials {
    /// Creates credentials from a username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

enum Transport {
    Http(HttpTransport),
    WebSocket(WsConnection),
}

/// A client for executing JSON-RPC methods on a remote Nimiq node, over
/// either plain HTTP request/response or a persistent WebSocket connection.
///
/// The URL scheme selects the transport. Subscriptions are only available
/// over `ws`/`wss`; the response timeout only applies to WebSocket calls.
/// Every instance owns its own request-id counter, pending-call table and
/// subscription registry.
pub struct RpcClient {
    scheme: String,
    transport: Transport,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

impl RpcClient {
    /// Connects to the node at `url` with the default response timeout.
    pub async fn connect(
        url: &str,
        credentials: Option<Credentials>,
    ) -> Result<Self, RpcClientError> {
        Self::connect_with_timeout(url, credentials, DEFAULT_RESPONSE_TIMEOUT).await
    }

    /// Connects to the node at `url`. `response_timeout` bounds how long a
    /// WebSocket call waits for its reply; it is ignored on HTTP.
    pub async fn connect_with_timeout(
        url: &str,
        credentials: Option<Credentials>,
        response_timeout: Duration,
    ) -> Result<Self, RpcClientError> {
        let url: Url = url.parse()?;
        let scheme = url.scheme().to_owned();
        let transport = match scheme.as_str() {
            "http" | "https" => Transport::Http(HttpTransport::new(url, credentials)),
            "ws" | "wss" => {
                Transport::WebSocket(WsConnection::connect(url, response_timeout).await?)
            }
            other => return Err(RpcClientError::UnsupportedScheme(other.to_owned())),
        };
        Ok(Self { scheme, transport })
    }

    /// Calls the provided JSON-RPC method and returns the decoded result.
    pub async fn call<SuccessT: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<SuccessT, RpcClientError> {
        match &self.transport {
            Transport::Http(http) => http.call(method, params).await,
            Transport::WebSocket(websocket) => {
                let result = websocket.call(method, params).await?;
                serde_json::from_value(result.clone()).map_err(|error| {
                    RpcClientError::InvalidResponse {
                        response: result.to_string(),
                        expected_type: std::any::type_name::<SuccessT>(),
                        error,
                    }
                })
            }
        }
    }

    /// Registers `handler` for the subscription established by calling
    /// `method` with `params`. Only valid over the WebSocket transport;
    /// over HTTP this fails before any network I/O.
    pub async fn subscribe(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
        handler: NotificationHandler,
    ) -> Result<(), RpcClientError> {
        match &self.transport {
            Transport::Http(_) => Err(RpcClientError::SubscriptionsUnsupported {
                scheme: self.scheme.clone(),
            }),
            Transport::WebSocket(websocket) => websocket.subscribe(method, params, handler).await,
        }
    }

    /// Stops dispatching pushes for the subscription established with
    /// `method`. Pushes still in flight for it are dropped silently.
    pub fn unsubscribe(&self, method: &str) {
        if let Transport::WebSocket(websocket) = &self.transport {
            websocket.unsubscribe(method);
        }
    }

    /// Closes the connection. Outstanding WebSocket calls are failed with
    /// [`RpcClientError::ConnectionClosed`]; no-op on HTTP.
    pub fn close(&self) {
        if let Transport::WebSocket(websocket) = &self.transport {
            websocket.close();
        }
    }
}
