#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use unlock_wallet::{
    ConnectionDescriptor, GatewayError, GatewayEvent, WalletConfig, WalletProvider, WalletService,
};
use unlock_wallet_adapters::abi::LockReader;
use unlock_wallet_core::{JsonRpcRequest, JsonRpcResponse};

type Handler = dyn Fn(&str, &Value) -> Result<Value, GatewayError> + Send + Sync;

/// Injected wallet backed by a closure; records every request it sees.
pub struct FakeWallet {
    handler: Box<Handler>,
    metamask: bool,
    pub requests: Mutex<Vec<JsonRpcRequest>>,
}

impl FakeWallet {
    pub fn new(
        handler: impl Fn(&str, &Value) -> Result<Value, GatewayError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            metamask: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn metamask(mut self) -> Self {
        self.metamask = true;
        self
    }

    pub fn recorded(&self) -> Vec<JsonRpcRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn sent(&self, method: &str) -> Vec<Value> {
        self.recorded()
            .into_iter()
            .filter(|r| r.method == method)
            .map(|r| r.params)
            .collect()
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, GatewayError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let result = (self.handler)(&request.method, &request.params)?;
        match result.get("__error") {
            Some(error) => Ok(JsonRpcResponse::failure(request.id, error.clone())),
            None => Ok(JsonRpcResponse::success(request.id, result)),
        }
    }

    fn is_metamask(&self) -> bool {
        self.metamask
    }
}

/// Handler result that makes [`FakeWallet`] answer with an `error` field.
pub fn rpc_error(code: i64, message: &str) -> Value {
    json!({ "__error": { "code": code, "message": message } })
}

pub fn account() -> Address {
    "0xAaAdEED4c0B861cB36f4cE006a9C90BA2E43fdc2"
        .parse()
        .expect("valid account")
}

pub fn lock_address() -> Address {
    "0x000000000000000000000000000000000000BEEF"
        .parse()
        .expect("valid lock address")
}

pub fn tx_hash() -> B256 {
    B256::repeat_byte(0xab)
}

fn selector<C: SolCall>() -> String {
    format!("0x{}", alloy::hex::encode(C::SELECTOR))
}

fn word(value: U256) -> Value {
    json!(format!("0x{}", alloy::hex::encode(value.to_be_bytes::<32>())))
}

/// Answers the calls every connected node sees, plus reads of a pre-versioning
/// lock at [`lock_address`]. Returns `None` for anything else.
pub fn node_basics(method: &str, params: &Value) -> Option<Value> {
    match method {
        "net_version" => Some(json!("1984")),
        "eth_accounts" => Some(json!([account().to_string().to_lowercase()])),
        "eth_getCode" => Some(json!("0xdeadbeef")),
        "eth_blockNumber" => Some(json!("0x2a")),
        "eth_getBalance" => Some(json!("0x6a94d74f430000")),
        "eth_call" => {
            let data = params[0]["data"].as_str().unwrap_or_default();
            if data.starts_with(&selector::<LockReader::publicLockVersionCall>()) {
                Some(rpc_error(-32000, "execution reverted"))
            } else if data.starts_with(&selector::<LockReader::keyPriceCall>()) {
                Some(word(U256::from(10_000_000_000_000_000u64)))
            } else if data.starts_with(&selector::<LockReader::expirationDurationCall>()) {
                Some(word(U256::from(86_400u64)))
            } else if data.starts_with(&selector::<LockReader::maxNumberOfKeysCall>()) {
                Some(word(U256::from(10u64)))
            } else if data.starts_with(&selector::<LockReader::ownerCall>()) {
                Some(json!(format!(
                    "0x{}{}",
                    "00".repeat(12),
                    alloy::hex::encode(account().as_slice())
                )))
            } else if data.starts_with(&selector::<LockReader::outstandingKeysCall>()) {
                Some(word(U256::from(2u64)))
            } else {
                None
            }
        }
        _ => None,
    }
}

pub fn unexpected(method: &str) -> GatewayError {
    GatewayError::Validation(format!("unexpected method {method}"))
}

pub async fn connected_service(wallet: Arc<FakeWallet>) -> WalletService {
    let mut service = WalletService::new(WalletConfig::default());
    service
        .connect(ConnectionDescriptor::Direct(wallet))
        .await
        .expect("connect");
    service
}

pub fn drain(rx: &mut broadcast::Receiver<GatewayEvent>) -> Vec<GatewayEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn names(events: &[GatewayEvent]) -> Vec<&'static str> {
    events.iter().map(GatewayEvent::name).collect()
}
