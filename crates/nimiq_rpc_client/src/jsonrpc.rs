//! JSON-RPC 2.0 envelope types shared by both transports.
//!
//! Encoding and decoding are pure `serde` transformations; no I/O happens
//! here.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// JSON-RPC protocol version. Only 2.0 exists on this wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Version {
    /// Version 2.0 of the JSON-RPC specification
    V2_0,
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Version::V2_0 => serializer.serialize_str("2.0"),
        }
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let version = String::deserialize(deserializer)?;
        if version == "2.0" {
            Ok(Version::V2_0)
        } else {
            Err(serde::de::Error::custom(format!(
                "unsupported JSON-RPC version: {version}"
            )))
        }
    }
}

/// A response identifier. This client only ever sends numeric identifiers,
/// but remote nodes are allowed to echo them back as strings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric identifier
    Num(u64),
    /// String identifier
    Str(String),
}

/// An outgoing JSON-RPC call envelope.
///
/// Arguments are positional; an absent optional argument is transmitted as
/// an explicit `null` unless the calling wrapper elects to omit it.
#[derive(Clone, Debug, Serialize)]
pub struct Request<'a> {
    /// JSON-RPC version
    #[serde(rename = "jsonrpc")]
    pub version: Version,
    /// The method name
    pub method: &'a str,
    /// The method's positional arguments
    pub params: Vec<serde_json::Value>,
    /// The request identifier, unique per connection
    pub id: u64,
}

/// An error object reported by the remote node. `code` and `message` are
/// required; a reply carrying an `error` object without them fails to
/// decode.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Error {
    /// The error code
    pub code: i64,
    /// The error message
    pub message: String,
    /// Additional, method-specific error details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.data {
            Some(data) => write!(formatter, "{}: {} ({})", self.message, data, self.code),
            None => write!(formatter, "{} ({})", self.message, self.code),
        }
    }
}

impl std::error::Error for Error {}

/// A reply to one outgoing call. The version marker is accepted but not
/// required; replies are recognized by carrying an `id` and a `result` or
/// `error` field.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Response<T> {
    /// JSON-RPC version
    #[serde(rename = "jsonrpc", default)]
    pub version: Option<Version>,
    /// The identifier of the call this reply answers
    pub id: Id,
    /// The result or error payload
    #[serde(flatten)]
    pub data: ResponseData<T>,
}

/// The payload of a reply: either a result or a remote error. The `Error`
/// variant is tried first, so a malformed reply carrying both fields is
/// treated as a failure rather than silently decoded into a result.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ResponseData<T> {
    /// The remote node reported an error.
    Error {
        /// The error object
        error: Error,
    },
    /// The call succeeded.
    Success {
        /// The result value
        result: T,
    },
}

impl<T> ResponseData<T> {
    /// Returns the result, or the remote error if the node reported one.
    pub fn into_result(self) -> Result<T, Error> {
        match self {
            ResponseData::Success { result } => Ok(result),
            ResponseData::Error { error } => Err(error),
        }
    }
}

/// An unsolicited server push on the WebSocket transport. It carries the
/// method name the subscription was established with, instead of an `id`
/// correlating it to a pending call.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Notification {
    /// The logical subscription name
    pub method: String,
    /// Positional parameters: the server-assigned subscription identifier
    /// followed by the pushed payload
    params: Vec<serde_json::Value>,
}

impl Notification {
    /// The server-assigned subscription identifier, i.e. the first
    /// positional parameter. `None` if the parameter is absent or not an
    /// integer.
    pub fn subscription(&self) -> Option<u64> {
        self.params.first().and_then(serde_json::Value::as_u64)
    }

    /// Consumes the notification, returning the pushed payload.
    pub fn into_payload(mut self) -> serde_json::Value {
        if self.params.len() > 1 {
            self.params.swap_remove(1)
        } else {
            serde_json::Value::Null
        }
    }
}

/// A single decoded inbound WebSocket frame: either a reply to a pending
/// call or a push notification.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InboundMessage {
    /// An unsolicited push tied to a subscription
    Notification(Notification),
    /// A reply to a pending call
    Reply(Response<serde_json::Value>),
}
