use std::fmt;
use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{
    ContractCall, ContractVersion, CreateLockParams, LockSnapshot, PurchaseKeyParams,
    UpdateKeyPriceParams, WithdrawParams,
};

/// JSON-RPC error object as returned inside a response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    /// Wallets and relays sometimes answer with a bare string instead of an object.
    pub fn from_value(value: &Value) -> Self {
        if let Ok(obj) = serde_json::from_value::<RpcErrorObject>(value.clone()) {
            return obj;
        }
        let message = match value {
            Value::String(s) => s.clone(),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| value.to_string()),
            other => other.to_string(),
        };
        Self {
            code: -32000,
            message,
            data: None,
        }
    }
}

impl fmt::Display for RpcErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("rpc error: {0}")]
    Rpc(RpcErrorObject),
    #[error("network failure: {0}")]
    Network(Arc<dyn std::error::Error + Send + Sync>),
    #[error("http status {0}")]
    Status(u16),
    #[error("relay channel closed")]
    ChannelClosed,
    #[error("response id mismatch: expected {expected}, got {actual:?}")]
    IdMismatch { expected: u64, actual: Option<u64> },
}

impl TransportError {
    pub fn network<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TransportError::Network(Arc::new(err))
    }
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("unsupported contract version: {0}")]
    UnsupportedVersion(String),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("wallet refused to sign: {0}")]
    Signing(RpcErrorObject),
    #[error("no wallet available")]
    NoWalletAvailable,
    #[error("provider not connected")]
    NotConnected,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_owned(),
            id,
            method: method.to_owned(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, error: Value) -> Self {
        Self {
            id: Some(id),
            result: None,
            error: Some(error),
        }
    }

    /// Error object carried by the envelope, if any. `null` counts as absent.
    pub fn error_object(&self) -> Option<RpcErrorObject> {
        match &self.error {
            None | Some(Value::Null) => None,
            Some(err) => Some(RpcErrorObject::from_value(err)),
        }
    }

    pub fn into_result(self) -> Result<Value, GatewayError> {
        if let Some(err) = self.error_object() {
            return Err(TransportError::Rpc(err).into());
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// Normalized calling convention every provider backend is reduced to.
#[async_trait]
pub trait RpcSender: Send + Sync {
    /// Sends one request and returns the full response envelope.
    async fn send_raw(&self, method: &str, params: Value) -> Result<JsonRpcResponse, GatewayError>;

    async fn send(&self, method: &str, params: Value) -> Result<Value, GatewayError> {
        self.send_raw(method, params).await?.into_result()
    }
}

/// Operation table every supported contract version implements.
///
/// State-changing operations only encode; the gateway owns dispatch and tracking.
#[async_trait]
pub trait LockOperations: Send + Sync {
    fn version(&self) -> ContractVersion;

    fn create_lock(
        &self,
        unlock: Address,
        from: Address,
        params: &CreateLockParams,
    ) -> Result<ContractCall, GatewayError>;

    fn purchase_key(
        &self,
        from: Address,
        params: &PurchaseKeyParams,
    ) -> Result<ContractCall, GatewayError>;

    fn withdraw_from_lock(&self, params: &WithdrawParams) -> Result<ContractCall, GatewayError>;

    fn partial_withdraw_from_lock(
        &self,
        params: &WithdrawParams,
    ) -> Result<ContractCall, GatewayError>;

    fn update_key_price(&self, params: &UpdateKeyPriceParams)
        -> Result<ContractCall, GatewayError>;

    async fn get_lock(
        &self,
        rpc: &dyn RpcSender,
        lock: Address,
    ) -> Result<LockSnapshot, GatewayError>;
}
