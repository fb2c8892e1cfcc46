//! Plain JSON-RPC over HTTP.

use std::time::Duration;

use serde_json::Value;

use unlock_wallet_core::{GatewayError, JsonRpcRequest, JsonRpcResponse, TransportError};

#[derive(Debug, Clone)]
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build rpc client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn post(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse, GatewayError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(TransportError::network)?;
        let status = response.status();
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(TransportError::Status(status.as_u16()).into())
            }
            Err(e) => return Err(TransportError::network(e).into()),
        };

        // Nodes report rpc errors with non-2xx codes; keep the error object when present.
        if !status.is_success() && body.get("error").is_none() {
            return Err(TransportError::Status(status.as_u16()).into());
        }

        let envelope: JsonRpcResponse = serde_json::from_value(body).map_err(|e| {
            GatewayError::InvalidResponse(format!("rpc response is not a json-rpc envelope: {e}"))
        })?;
        if envelope.id != Some(request.id) {
            return Err(TransportError::IdMismatch {
                expected: request.id,
                actual: envelope.id,
            }
            .into());
        }
        Ok(envelope)
    }
}
