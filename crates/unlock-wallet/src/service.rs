//! The gateway: owns the connection, dispatches version-agnostic lock
//! operations and publishes their lifecycle on the event bus.

use std::sync::Arc;

use alloy::primitives::{Address, B256};
use serde_json::{json, Value};
use tokio::sync::broadcast;

use unlock_wallet_adapters::abi::{parse_quantity, quantity_to_u64};
use unlock_wallet_adapters::{ConnectionDescriptor, ProviderAdapter, SigningFacade, VersionRegistry, WalletConfig};
use unlock_wallet_core::{
    ChainObservation, ContractCall, ContractKind, CreateLockParams, EventBus, GatewayError,
    GatewayEvent, LockOperations, LockSnapshot, PurchaseKeyParams, RpcSender, SentTransaction,
    Transaction, TransactionTracker, UpdateKeyPriceParams, WalletInfo, WithdrawParams,
};

pub struct WalletService {
    config: WalletConfig,
    events: EventBus,
    tracker: TransactionTracker,
    registry: VersionRegistry,
    provider: Option<Arc<ProviderAdapter>>,
    account: Option<Address>,
    network_id: Option<u64>,
    wallet_info: WalletInfo,
    generation: u64,
    ready: bool,
}

impl WalletService {
    pub fn new(config: WalletConfig) -> Self {
        let events = EventBus::new(config.event_capacity);
        Self {
            tracker: TransactionTracker::new(events.clone()),
            events,
            registry: VersionRegistry::new(),
            provider: None,
            account: None,
            network_id: None,
            wallet_info: WalletInfo::unavailable(),
            generation: 0,
            ready: false,
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn network_id(&self) -> Option<u64> {
        self.network_id
    }

    pub fn wallet_info(&self) -> WalletInfo {
        self.wallet_info
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Opens a provider connection, dropping any previous one with its
    /// account, network and version cache.
    pub async fn connect(&mut self, descriptor: ConnectionDescriptor) -> Result<WalletInfo, GatewayError> {
        self.provider = None;
        self.account = None;
        self.network_id = None;
        self.ready = false;
        self.registry.clear();
        self.generation += 1;

        let (adapter, info) = ProviderAdapter::connect(descriptor, &self.config, self.generation).await?;
        tracing::info!(
            generation = self.generation,
            flavor = ?adapter.flavor(),
            no_wallet = info.no_wallet,
            "provider connected"
        );
        let adapter = Arc::new(adapter);
        self.provider = Some(Arc::clone(&adapter));
        self.wallet_info = info;
        self.events.emit(GatewayEvent::WalletInfo(info));
        if info.no_wallet {
            return Ok(info);
        }

        let raw = adapter.send("net_version", json!([])).await?;
        let network = quantity_to_u64(parse_quantity(&raw)?, "net_version")?;
        if let Some(required) = self.config.required_chain_id {
            if network != required {
                let err = GatewayError::Validation(format!(
                    "connected to network {network}, expected {required}"
                ));
                self.events.emit(GatewayEvent::Error(err.clone()));
                return Err(err);
            }
        }
        self.network_id = Some(network);
        self.events.emit(GatewayEvent::NetworkChanged(network));
        Ok(info)
    }

    /// Replaces the current connection. Request ids restart under a new generation.
    pub async fn reconnect(&mut self, descriptor: ConnectionDescriptor) -> Result<WalletInfo, GatewayError> {
        tracing::info!(previous = self.generation, ?descriptor, "reconnecting");
        self.connect(descriptor).await
    }

    fn provider(&self) -> Result<Arc<ProviderAdapter>, GatewayError> {
        let provider = self.provider.as_ref().ok_or(GatewayError::NotConnected)?;
        if self.wallet_info.no_wallet {
            return Err(GatewayError::NoWalletAvailable);
        }
        Ok(Arc::clone(provider))
    }

    fn sender(&self) -> Result<Address, GatewayError> {
        self.account.ok_or_else(|| {
            GatewayError::Validation("no account loaded; call get_account first".to_owned())
        })
    }

    /// Loads the node's first account. An empty account list leaves the
    /// service not ready and yields `None`.
    pub async fn get_account(&mut self) -> Result<Option<Address>, GatewayError> {
        let provider = self.provider()?;
        let raw = provider.send("eth_accounts", json!([])).await?;
        let first = raw
            .as_array()
            .and_then(|accounts| accounts.first())
            .and_then(Value::as_str);
        let Some(first) = first else {
            tracing::info!("node exposes no account");
            return Ok(None);
        };
        let account: Address = first
            .parse()
            .map_err(|e| GatewayError::InvalidResponse(format!("invalid account '{first}': {e}")))?;

        self.account = Some(account);
        self.ready = true;
        self.events.emit(GatewayEvent::AccountChanged(account));
        self.events.emit(GatewayEvent::Ready);
        Ok(Some(account))
    }

    pub async fn is_unlock_contract_deployed(&self) -> Result<bool, GatewayError> {
        let provider = self.provider()?;
        let code = provider
            .send(
                "eth_getCode",
                json!([self.config.unlock_address.to_string(), "latest"]),
            )
            .await?;
        Ok(!matches!(code.as_str(), None | Some("") | Some("0x") | Some("0x0")))
    }

    async fn lock_operations(
        &self,
        provider: &ProviderAdapter,
        kind: ContractKind,
        address: Address,
    ) -> Result<&'static dyn LockOperations, GatewayError> {
        self.registry.operations_for(provider, kind, address).await
    }

    pub async fn create_lock(&self, params: &CreateLockParams) -> Result<Transaction, GatewayError> {
        let provider = self.provider()?;
        let from = self.sender()?;
        let unlock = self.config.unlock_address;
        let ops = self
            .lock_operations(&provider, ContractKind::Unlock, unlock)
            .await?;
        let call = ops.create_lock(unlock, from, params)?;
        self.dispatch(provider, call).await
    }

    pub async fn purchase_key(&self, params: &PurchaseKeyParams) -> Result<Transaction, GatewayError> {
        let provider = self.provider()?;
        let from = self.sender()?;
        let ops = self
            .lock_operations(&provider, ContractKind::PublicLock, params.lock)
            .await?;
        let call = ops.purchase_key(from, params)?;
        self.dispatch(provider, call).await
    }

    pub async fn withdraw_from_lock(&self, params: &WithdrawParams) -> Result<Transaction, GatewayError> {
        let provider = self.provider()?;
        let ops = self
            .lock_operations(&provider, ContractKind::PublicLock, params.lock)
            .await?;
        let call = ops.withdraw_from_lock(params)?;
        self.dispatch(provider, call).await
    }

    pub async fn partial_withdraw_from_lock(
        &self,
        params: &WithdrawParams,
    ) -> Result<Transaction, GatewayError> {
        let provider = self.provider()?;
        let ops = self
            .lock_operations(&provider, ContractKind::PublicLock, params.lock)
            .await?;
        let call = ops.partial_withdraw_from_lock(params)?;
        self.dispatch(provider, call).await
    }

    pub async fn update_key_price(
        &self,
        params: &UpdateKeyPriceParams,
    ) -> Result<Transaction, GatewayError> {
        let provider = self.provider()?;
        let ops = self
            .lock_operations(&provider, ContractKind::PublicLock, params.lock)
            .await?;
        let call = ops.update_key_price(params)?;
        self.dispatch(provider, call).await
    }

    /// Sends `call` through the tracker. A failure is also published as an
    /// `error` event; the caller gets the original error back.
    async fn dispatch(
        &self,
        provider: Arc<ProviderAdapter>,
        call: ContractCall,
    ) -> Result<Transaction, GatewayError> {
        let kind = call.kind;
        let request = call.to_request_json();
        let ContractCall { from, to, data, .. } = call;

        let result = self
            .tracker
            .track(kind, async move {
                let raw = provider.send("eth_sendTransaction", json!([request])).await?;
                let hash = parse_hash(&raw)?;
                Ok(SentTransaction {
                    hash,
                    from,
                    to,
                    data,
                })
            })
            .await;

        match &result {
            Ok(tx) => tracing::debug!(kind = kind.as_str(), hash = %tx.hash, "transaction submitted"),
            Err(err) => {
                tracing::debug!(kind = kind.as_str(), error = %err, "transaction failed");
                self.events.emit(GatewayEvent::Error(err.clone()));
            }
        }
        result
    }

    /// Reads the lock's current state and publishes it as `lock.updated`.
    pub async fn get_lock(&self, address: Address) -> Result<LockSnapshot, GatewayError> {
        let provider = self.provider()?;
        let ops = self
            .lock_operations(&provider, ContractKind::PublicLock, address)
            .await?;
        let snapshot = ops.get_lock(provider.as_ref(), address).await?;
        self.events.emit(GatewayEvent::LockUpdated {
            address,
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    pub async fn sign_data(&self, account: Address, data: &Value) -> Result<String, GatewayError> {
        let provider = self.provider()?;
        SigningFacade::new(provider.as_ref(), provider.flavor())
            .sign_data(account, data)
            .await
    }

    pub async fn sign_data_personal(&self, account: Address, text: &str) -> Result<String, GatewayError> {
        let provider = self.provider()?;
        SigningFacade::new(provider.as_ref(), provider.flavor())
            .sign_data_personal(account, text)
            .await
    }

    /// Asks the node once where `transaction` stands and advances its status.
    /// Returns whether the status changed.
    pub async fn refresh_transaction(&self, transaction: &mut Transaction) -> Result<bool, GatewayError> {
        let provider = self.provider()?;
        let hash = transaction.hash.to_string();

        let found = provider
            .send("eth_getTransactionByHash", json!([hash]))
            .await?;
        let observation = if found.is_null() {
            ChainObservation::NotFound
        } else {
            let receipt = provider
                .send("eth_getTransactionReceipt", json!([hash]))
                .await?;
            observation_from_receipt(&receipt)?
        };
        self.tracker.observe(transaction, observation)
    }
}

fn parse_hash(raw: &Value) -> Result<B256, GatewayError> {
    let hash = raw.as_str().ok_or_else(|| {
        GatewayError::InvalidResponse("eth_sendTransaction returned no hash".to_owned())
    })?;
    if hash.is_empty() || hash == "0x" {
        return Ok(B256::ZERO);
    }
    hash.parse()
        .map_err(|e| GatewayError::InvalidResponse(format!("invalid transaction hash '{hash}': {e}")))
}

fn observation_from_receipt(receipt: &Value) -> Result<ChainObservation, GatewayError> {
    if receipt.is_null() {
        return Ok(ChainObservation::InMempool);
    }
    let block_number = quantity_to_u64(parse_quantity(&receipt["blockNumber"])?, "blockNumber")?;
    // Pre-Byzantium receipts carry no status; inclusion counts as success.
    let success = match receipt.get("status") {
        None | Some(Value::Null) => true,
        Some(status) => !parse_quantity(status)?.is_zero(),
    };
    Ok(ChainObservation::Included {
        block_number,
        success,
    })
}
