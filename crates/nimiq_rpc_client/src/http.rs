//! Plain HTTP request/response transport.
//!
//! Every call fully owns the session for its duration, so no correlation
//! table is needed: one POST, one reply.

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    client::{Credentials, RpcClientError},
    jsonrpc,
};

pub(crate) struct HttpTransport {
    url: Url,
    client: HttpClient,
    credentials: Option<Credentials>,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(url: Url, credentials: Option<Credentials>) -> Self {
        Self {
            url,
            client: HttpClient::new(),
            credentials,
            next_id: AtomicU64::new(1),
        }
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub async fn call<SuccessT: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<SuccessT, RpcClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = jsonrpc::Request {
            version: jsonrpc::Version::V2_0,
            method,
            params,
            id,
        };
        let body = serde_json::to_string(&request).map_err(RpcClientError::InvalidJsonRequest)?;

        let mut request = self.client.post(self.url.clone()).body(body);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let response = request
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(RpcClientError::FailedToSend)?
            .error_for_status()
            .map_err(RpcClientError::HttpStatus)?
            .text()
            .await
            .map_err(RpcClientError::CorruptedResponse)?;

        let response: jsonrpc::Response<SuccessT> =
            serde_json::from_str(&response).map_err(|error| RpcClientError::InvalidResponse {
                response,
                expected_type: std::any::type_name::<jsonrpc::Response<SuccessT>>(),
                error,
            })?;

        response
            .data
            .into_result()
            .map_err(RpcClientError::JsonRpcError)
    }
}
