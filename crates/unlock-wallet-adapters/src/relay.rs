//! Message relay standing in for a remote user-account wallet.
//!
//! [`RelayChannel`] is the gateway side: it serializes calls into
//! `{method, params, id}` messages. [`RelayHost`] is the wallet side: it
//! receives unvalidated payloads and answers them, either from a proxied user
//! account or by forwarding to a native wallet backend.

use std::sync::Arc;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};

use unlock_wallet_core::{GatewayError, RpcSender, TransportError, WalletFlavor, WalletInfo};

const NO_WALLET: &str = "No web3 wallet is available";

/// Asked once by the gateway at connect; the host answers with its [`WalletInfo`].
pub const WALLET_INFO_METHOD: &str = "unlock_walletInfo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayRequest {
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayReply {
    pub id: u64,
    pub error: Option<Value>,
    pub result: Option<Value>,
}

impl RelayReply {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            id,
            error: None,
            result: Some(result),
        }
    }

    pub fn error(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            error: Some(Value::String(message.into())),
            result: None,
        }
    }
}

/// Returns the request only if `method` is a non-empty string, `params` is a
/// list and `id` is an integer.
pub fn validate_method_call(payload: &Value) -> Option<RelayRequest> {
    let obj = payload.as_object()?;
    let method = obj
        .get("method")?
        .as_str()
        .filter(|m| !m.is_empty())?;
    let params = obj.get("params")?.as_array()?;
    let id = integer_id(obj.get("id")?)?;
    Some(RelayRequest {
        method: method.to_owned(),
        params: params.clone(),
        id,
    })
}

fn integer_id(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

#[derive(Debug)]
pub struct RelayMessage {
    pub payload: Value,
    pub reply: oneshot::Sender<RelayReply>,
}

pub fn relay_channel(capacity: usize) -> (RelayChannel, mpsc::Receiver<RelayMessage>) {
    let (outbox, inbox) = mpsc::channel(capacity.max(1));
    (
        RelayChannel {
            outbox,
            log_drops: false,
        },
        inbox,
    )
}

#[derive(Debug, Clone)]
pub struct RelayChannel {
    outbox: mpsc::Sender<RelayMessage>,
    log_drops: bool,
}

impl RelayChannel {
    pub fn with_drop_logging(mut self, enabled: bool) -> Self {
        self.log_drops = enabled;
        self
    }

    /// Posts `payload` and waits for the reply carrying the same id.
    /// Malformed payloads never leave this side of the channel.
    pub async fn call(&self, payload: Value) -> Result<RelayReply, GatewayError> {
        let Some(request) = validate_method_call(&payload) else {
            if self.log_drops {
                tracing::debug!(%payload, "dropping malformed relay request");
            }
            return Err(GatewayError::MalformedRequest(
                "relay request needs a method name, list params and an integer id".to_owned(),
            ));
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        self.outbox
            .send(RelayMessage {
                payload,
                reply: reply_tx,
            })
            .await
            .map_err(|_| TransportError::ChannelClosed)?;
        let reply = reply_rx.await.map_err(|_| TransportError::ChannelClosed)?;
        if reply.id != request.id {
            return Err(TransportError::IdMismatch {
                expected: request.id,
                actual: Some(reply.id),
            }
            .into());
        }
        Ok(reply)
    }
}

#[derive(Clone)]
pub struct RelayHost {
    native: Option<Arc<dyn RpcSender>>,
    flavor: WalletFlavor,
    proxy_account: Option<Address>,
    proxy_network: u64,
    log_drops: bool,
}

impl RelayHost {
    /// Host backed by a wallet injected in the embedding page.
    pub fn native(backend: Arc<dyn RpcSender>, flavor: WalletFlavor) -> Self {
        Self {
            native: Some(backend),
            flavor,
            proxy_account: None,
            proxy_network: 0,
            log_drops: false,
        }
    }

    /// Host answering for a hosted user account. `None` means nobody is logged in.
    pub fn user_account(account: Option<Address>, network: u64) -> Self {
        Self {
            native: None,
            flavor: WalletFlavor::Generic,
            proxy_account: account,
            proxy_network: network,
            log_drops: false,
        }
    }

    pub fn with_drop_logging(mut self, enabled: bool) -> Self {
        self.log_drops = enabled;
        self
    }

    pub fn has_wallet(&self) -> bool {
        self.native.is_some() || self.proxy_account.is_some()
    }

    fn use_user_account(&self) -> bool {
        self.native.is_none() && self.proxy_account.is_some()
    }

    pub fn wallet_info(&self) -> WalletInfo {
        if self.has_wallet() {
            WalletInfo::available(self.flavor)
        } else {
            WalletInfo::unavailable()
        }
    }

    /// Answers one raw payload. Malformed payloads are dropped and yield `None`.
    pub async fn handle(&self, payload: Value) -> Option<RelayReply> {
        let Some(request) = validate_method_call(&payload) else {
            if self.log_drops {
                tracing::debug!(%payload, "relay host dropped malformed payload");
            }
            return None;
        };

        if request.method == WALLET_INFO_METHOD {
            let info = serde_json::to_value(self.wallet_info()).ok()?;
            return Some(RelayReply::success(request.id, info));
        }
        if !self.has_wallet() {
            return Some(RelayReply::error(request.id, NO_WALLET));
        }
        if self.use_user_account() {
            return Some(self.handle_user_account_call(&request));
        }

        let native = self.native.as_ref()?;
        let id = request.id;
        let reply = match native
            .send_raw(&request.method, Value::Array(request.params))
            .await
        {
            Ok(response) => RelayReply {
                id,
                error: response
                    .error_object()
                    .and_then(|e| serde_json::to_value(e).ok()),
                result: response.result,
            },
            Err(err) => RelayReply::error(id, err.to_string()),
        };
        Some(reply)
    }

    /// The hosted account only knows about itself and its network.
    fn handle_user_account_call(&self, request: &RelayRequest) -> RelayReply {
        match request.method.as_str() {
            "eth_accounts" => {
                let accounts: Vec<String> =
                    self.proxy_account.iter().map(|a| a.to_string()).collect();
                RelayReply::success(request.id, json!(accounts))
            }
            "net_version" => RelayReply::success(request.id, json!(self.proxy_network.to_string())),
            other => RelayReply::error(request.id, format!("\"{other}\" is not supported")),
        }
    }

    /// Serves the inbox until every [`RelayChannel`] clone is dropped.
    pub async fn run(self, mut inbox: mpsc::Receiver<RelayMessage>) {
        while let Some(message) = inbox.recv().await {
            let host = self.clone();
            tokio::spawn(async move {
                if let Some(reply) = host.handle(message.payload).await {
                    let _ = message.reply.send(reply);
                }
            });
        }
        tracing::debug!("relay inbox closed");
    }
}
