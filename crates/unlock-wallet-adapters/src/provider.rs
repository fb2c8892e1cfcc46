use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use unlock_wallet_core::{
    GatewayError, JsonRpcRequest, JsonRpcResponse, RpcSender, WalletFlavor, WalletInfo,
};

use crate::relay::{RelayChannel, WALLET_INFO_METHOD};
use crate::rpc::HttpTransport;
use crate::WalletConfig;

/// A wallet injected by the host environment (browser extension, embedded signer).
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, GatewayError>;

    /// MetaMask-style wallets self-identify; everything else is generic.
    fn is_metamask(&self) -> bool {
        false
    }

    /// Asks the user to expose accounts. Wallets without the concept accept.
    async fn enable(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[derive(Clone)]
pub enum ConnectionDescriptor {
    Direct(Arc<dyn WalletProvider>),
    /// Default local JSON-RPC endpoint from [`WalletConfig::local_rpc_url`].
    LocalRpc,
    Relay(RelayChannel),
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionDescriptor::Direct(_) => f.write_str("Direct"),
            ConnectionDescriptor::LocalRpc => f.write_str("LocalRpc"),
            ConnectionDescriptor::Relay(_) => f.write_str("Relay"),
        }
    }
}

enum Backend {
    Direct(Arc<dyn WalletProvider>),
    Http(HttpTransport),
    Relay(RelayChannel),
}

/// The single active connection of a gateway. Reconnecting builds a new one;
/// ids are counted per adapter and never shared across generations.
pub struct ProviderAdapter {
    backend: Backend,
    flavor: WalletFlavor,
    generation: u64,
    next_id: AtomicU64,
}

impl fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backend = match &self.backend {
            Backend::Direct(_) => "direct",
            Backend::Http(_) => "http",
            Backend::Relay(_) => "relay",
        };
        f.debug_struct("ProviderAdapter")
            .field("backend", &backend)
            .field("flavor", &self.flavor)
            .field("generation", &self.generation)
            .finish()
    }
}

impl ProviderAdapter {
    /// Opens a connection and reports what kind of wallet sits behind it.
    /// The flavor is detected here once and cached for the adapter's lifetime.
    pub async fn connect(
        descriptor: ConnectionDescriptor,
        config: &WalletConfig,
        generation: u64,
    ) -> Result<(Self, WalletInfo), GatewayError> {
        match descriptor {
            ConnectionDescriptor::Direct(wallet) => {
                let mut flavor = if wallet.is_metamask() {
                    WalletFlavor::MetaMask
                } else {
                    WalletFlavor::Generic
                };
                let mut info = WalletInfo::available(flavor);
                if let Err(err) = wallet.enable().await {
                    tracing::info!(error = %err, "wallet declined to enable");
                    flavor = WalletFlavor::Generic;
                    info = WalletInfo {
                        no_wallet: false,
                        not_enabled: true,
                        is_metamask: false,
                    };
                }
                Ok((
                    Self::new(Backend::Direct(wallet), flavor, generation),
                    info,
                ))
            }
            ConnectionDescriptor::LocalRpc => {
                let url = config.local_rpc_url()?;
                let transport = HttpTransport::new(url, config.rpc_timeout_ms)?;
                Ok((
                    Self::new(Backend::Http(transport), WalletFlavor::Generic, generation),
                    WalletInfo::available(WalletFlavor::Generic),
                ))
            }
            ConnectionDescriptor::Relay(channel) => {
                let channel = channel.with_drop_logging(config.is_development());
                let mut adapter =
                    Self::new(Backend::Relay(channel), WalletFlavor::Generic, generation);
                // A relay with nobody logged in is a steady state, reported through WalletInfo.
                let info = match adapter.send(WALLET_INFO_METHOD, json!([])).await {
                    Ok(reply) => serde_json::from_value::<WalletInfo>(reply).map_err(|e| {
                        GatewayError::InvalidResponse(format!("relay wallet info: {e}"))
                    })?,
                    Err(GatewayError::Transport(_)) => WalletInfo::unavailable(),
                    Err(err) => return Err(err),
                };
                adapter.flavor = info.flavor();
                Ok((adapter, info))
            }
        }
    }

    fn new(backend: Backend, flavor: WalletFlavor, generation: u64) -> Self {
        Self {
            backend,
            flavor,
            generation,
            next_id: AtomicU64::new(0),
        }
    }

    pub fn flavor(&self) -> WalletFlavor {
        self.flavor
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl RpcSender for ProviderAdapter {
    async fn send_raw(&self, method: &str, params: Value) -> Result<JsonRpcResponse, GatewayError> {
        let request = JsonRpcRequest::new(self.next_request_id(), method, params);
        tracing::debug!(
            method,
            id = request.id,
            generation = self.generation,
            "rpc dispatch"
        );

        match &self.backend {
            Backend::Direct(wallet) => wallet.request(request).await,
            Backend::Http(transport) => transport.post(&request).await,
            Backend::Relay(channel) => {
                let payload = serde_json::to_value(&request).map_err(|e| {
                    GatewayError::MalformedRequest(format!("request not serializable: {e}"))
                })?;
                let reply = channel.call(payload).await?;
                Ok(JsonRpcResponse {
                    id: Some(reply.id),
                    result: reply.result,
                    error: reply.error,
                })
            }
        }
    }
}
