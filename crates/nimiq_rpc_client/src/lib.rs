#![warn(missing_docs)]

//! Nimiq JSON-RPC client transport layer.
//!
//! Provides the wire envelope, the HTTP request/response transport and the
//! WebSocket transport with request/response correlation and server-push
//! subscription dispatch. The typed API surface lives in the `nimiq_rpc`
//! crate and is layered on top of [`RpcClient`].

mod client;
mod http;
mod subscription;
mod websocket;

/// Types specific to JSON-RPC
pub mod jsonrpc;

pub use client::{Credentials, RpcClient, RpcClientError};
pub use subscription::NotificationHandler;
pub use websocket::DEFAULT_RESPONSE_TIMEOUT;
