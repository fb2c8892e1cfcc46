//! Typed-data and personal-message signing through the connected wallet.

use alloy::primitives::{keccak256, Address};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};

use unlock_wallet_core::{
    call_transition, CallAction, CallState, GatewayError, RpcSender, WalletFlavor,
};

/// MetaMask only accepts typed data as a JSON string under the `_v3` method.
pub fn typed_data_request(flavor: WalletFlavor, account: Address, data: &Value) -> (&'static str, Value) {
    match flavor {
        WalletFlavor::MetaMask => (
            "eth_signTypedData_v3",
            json!([account.to_string(), data.to_string()]),
        ),
        WalletFlavor::Generic => ("eth_signTypedData", json!([account.to_string(), data])),
    }
}

pub fn personal_sign_request(account: Address, text: &str) -> (&'static str, Value) {
    let digest = keccak256(text.as_bytes());
    (
        "personal_sign",
        json!([format!("0x{}", alloy::hex::encode(digest)), account.to_string()]),
    )
}

pub struct SigningFacade<'a> {
    rpc: &'a dyn RpcSender,
    flavor: WalletFlavor,
}

impl<'a> SigningFacade<'a> {
    pub fn new(rpc: &'a dyn RpcSender, flavor: WalletFlavor) -> Self {
        Self { rpc, flavor }
    }

    /// Signs EIP-712 typed data; returns the signature base64-encoded.
    pub async fn sign_data(&self, account: Address, data: &Value) -> Result<String, GatewayError> {
        let (method, params) = typed_data_request(self.flavor, account, data);
        self.sign(method, params).await
    }

    /// Signs the keccak digest of `text`; returns the signature base64-encoded.
    pub async fn sign_data_personal(&self, account: Address, text: &str) -> Result<String, GatewayError> {
        let (method, params) = personal_sign_request(account, text);
        self.sign(method, params).await
    }

    async fn sign(&self, method: &'static str, params: Value) -> Result<String, GatewayError> {
        let state = call_transition(CallState::Created, CallAction::Send)?;
        tracing::debug!(method, ?state, "signing request");

        let response = match self.rpc.send_raw(method, params).await {
            Ok(response) => response,
            Err(err) => {
                let state = call_transition(state, CallAction::Fail)?;
                tracing::debug!(method, ?state, error = %err, "signing transport failed");
                return Err(err);
            }
        };

        if let Some(err) = response.error_object() {
            let state = call_transition(state, CallAction::Fail)?;
            tracing::debug!(method, ?state, error = %err, "wallet refused to sign");
            return Err(GatewayError::Signing(err));
        }

        let signature = match response.result {
            Some(Value::String(signature)) => signature,
            other => {
                call_transition(state, CallAction::Fail)?;
                return Err(GatewayError::InvalidResponse(format!(
                    "{method} returned a non-string result: {}",
                    other.unwrap_or(Value::Null)
                )));
            }
        };
        let state = call_transition(state, CallAction::Succeed)?;
        tracing::debug!(method, ?state, "signed");
        Ok(STANDARD.encode(signature.as_bytes()))
    }
}
