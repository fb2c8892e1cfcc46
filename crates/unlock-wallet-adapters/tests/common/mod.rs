#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use serde_json::{json, Value};
use tiny_http::{Response, Server};

use unlock_wallet_adapters::abi::{Erc20, LockReader, UnlockReader};
use unlock_wallet_adapters::WalletProvider;
use unlock_wallet_core::{GatewayError, JsonRpcRequest, JsonRpcResponse, RpcSender};

type Handler = dyn Fn(&str, &Value) -> Result<Value, GatewayError> + Send + Sync;

/// In-memory wallet that records every request and answers from a closure.
/// A handler result built with [`wallet_error`] becomes an error envelope.
pub struct ScriptedWallet {
    handler: Box<Handler>,
    metamask: bool,
    refuse_enable: bool,
    pub requests: Mutex<Vec<JsonRpcRequest>>,
}

impl ScriptedWallet {
    pub fn new(
        handler: impl Fn(&str, &Value) -> Result<Value, GatewayError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            metamask: false,
            refuse_enable: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn metamask(mut self) -> Self {
        self.metamask = true;
        self
    }

    pub fn refusing_enable(mut self) -> Self {
        self.refuse_enable = true;
        self
    }

    pub fn recorded(&self) -> Vec<JsonRpcRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

const ERROR_MARKER: &str = "__wallet_error";

/// Result value a handler returns to make the wallet answer with an `error` field.
pub fn wallet_error(error: Value) -> Value {
    let mut marked = serde_json::Map::new();
    marked.insert(ERROR_MARKER.to_owned(), error);
    Value::Object(marked)
}

fn envelope(id: u64, outcome: Value) -> JsonRpcResponse {
    match outcome.get(ERROR_MARKER) {
        Some(error) => JsonRpcResponse::failure(id, error.clone()),
        None => JsonRpcResponse::success(id, outcome),
    }
}

#[async_trait]
impl WalletProvider for ScriptedWallet {
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, GatewayError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let outcome = (self.handler)(&request.method, &request.params)?;
        Ok(envelope(request.id, outcome))
    }

    fn is_metamask(&self) -> bool {
        self.metamask
    }

    async fn enable(&self) -> Result<(), GatewayError> {
        if self.refuse_enable {
            return Err(GatewayError::Validation("user rejected".to_owned()));
        }
        Ok(())
    }
}

/// Same contract as [`ScriptedWallet`], but plugged in directly as an [`RpcSender`].
pub struct ScriptedSender {
    handler: Box<Handler>,
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedSender {
    pub fn new(
        handler: impl Fn(&str, &Value) -> Result<Value, GatewayError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }
}

#[async_trait]
impl RpcSender for ScriptedSender {
    async fn send_raw(&self, method: &str, params: Value) -> Result<JsonRpcResponse, GatewayError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((method.to_owned(), params.clone()));
        let outcome = (self.handler)(method, &params)?;
        Ok(envelope(0, outcome))
    }
}

pub fn account() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid account")
}

pub fn lock_address() -> Address {
    "0x000000000000000000000000000000000000BEEF"
        .parse()
        .expect("valid lock address")
}

pub fn token_address() -> Address {
    "0x00000000000000000000000000000000000070Ce"
        .parse()
        .expect("valid token address")
}

pub fn word(value: U256) -> String {
    format!("0x{}", alloy::hex::encode(value.to_be_bytes::<32>()))
}

pub fn address_word(address: Address) -> String {
    format!("0x{}{}", "00".repeat(12), alloy::hex::encode(address.as_slice()))
}

pub fn selector_hex<C: SolCall>() -> String {
    format!("0x{}", alloy::hex::encode(C::SELECTOR))
}

/// Call data of an `eth_call` request, as sent.
pub fn call_data(params: &Value) -> &str {
    params[0]["data"].as_str().unwrap_or_default()
}

/// On-chain state served by [`lock_chain`].
#[derive(Debug, Clone)]
pub struct LockFixture {
    pub version_number: Option<u64>,
    pub key_price: U256,
    pub max_keys: U256,
    pub owner: Address,
    pub outstanding_keys: u64,
    pub total_supply: u64,
    pub token: Address,
    pub token_decimals: u8,
    pub balance: U256,
}

impl Default for LockFixture {
    fn default() -> Self {
        Self {
            version_number: None,
            key_price: U256::from(10_000_000_000_000_000u64),
            max_keys: U256::MAX,
            owner: account(),
            outstanding_keys: 3,
            total_supply: 5,
            token: Address::ZERO,
            token_decimals: 18,
            balance: U256::from(30_000_000_000_000_000u64),
        }
    }
}

/// Node answering every read a lock snapshot or version probe needs.
pub fn lock_chain(fixture: LockFixture) -> ScriptedSender {
    ScriptedSender::new(move |method, params| match method {
        "eth_getCode" => Ok(json!("0x6080")),
        "eth_blockNumber" => Ok(json!("0x10")),
        "eth_getBalance" => Ok(json!(format!("0x{:x}", fixture.balance))),
        "eth_call" => {
            let data = call_data(params);
            let answer = if data.starts_with(&selector_hex::<LockReader::keyPriceCall>()) {
                word(fixture.key_price)
            } else if data.starts_with(&selector_hex::<LockReader::expirationDurationCall>()) {
                word(U256::from(2_592_000u64))
            } else if data.starts_with(&selector_hex::<LockReader::maxNumberOfKeysCall>()) {
                word(fixture.max_keys)
            } else if data.starts_with(&selector_hex::<LockReader::ownerCall>()) {
                address_word(fixture.owner)
            } else if data.starts_with(&selector_hex::<LockReader::outstandingKeysCall>()) {
                word(U256::from(fixture.outstanding_keys))
            } else if data.starts_with(&selector_hex::<LockReader::totalSupplyCall>()) {
                word(U256::from(fixture.total_supply))
            } else if data.starts_with(&selector_hex::<LockReader::tokenAddressCall>()) {
                address_word(fixture.token)
            } else if data.starts_with(&selector_hex::<LockReader::publicLockVersionCall>())
                || data.starts_with(&selector_hex::<UnlockReader::unlockVersionCall>())
            {
                match fixture.version_number {
                    Some(n) => word(U256::from(n)),
                    None => {
                        return Ok(wallet_error(
                            json!({"code": -32000, "message": "execution reverted"}),
                        ))
                    }
                }
            } else if data.starts_with(&selector_hex::<Erc20::balanceOfCall>()) {
                word(fixture.balance)
            } else if data.starts_with(&selector_hex::<Erc20::decimalsCall>()) {
                word(U256::from(fixture.token_decimals))
            } else {
                return Err(GatewayError::Validation(format!("unexpected call {data}")));
            };
            Ok(json!(answer))
        }
        other => Err(GatewayError::Validation(format!("unexpected method {other}"))),
    })
}

/// JSON-RPC node on a local port. `answer` maps `(method, params)` to a
/// result; the server echoes the request id.
pub fn spawn_rpc_server(
    requests: usize,
    seen: Arc<Mutex<Vec<Value>>>,
    answer: impl Fn(&str, &Value) -> Value + Send + 'static,
) -> (String, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());

    let join = thread::spawn(move || {
        for _ in 0..requests {
            let mut req = match server.recv() {
                Ok(r) => r,
                Err(_) => break,
            };
            let mut body = String::new();
            if req.as_reader().read_to_string(&mut body).is_err() {
                break;
            }
            let request: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            if let Ok(mut g) = seen.lock() {
                g.push(request.clone());
            }
            let method = request["method"].as_str().unwrap_or_default().to_owned();
            let result = answer(&method, &request["params"]);
            let payload = json!({ "jsonrpc": "2.0", "id": request["id"], "result": result });
            let _ = req.respond(Response::from_string(payload.to_string()));
        }
    });

    (addr, join)
}
