//! One operation table per deployed contract version, and the registry that
//! picks the right one for a given address.

mod reader;
pub mod v0;
pub mod v01;
pub mod v02;
pub mod v10;

use std::collections::HashMap;
use std::sync::Mutex;

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use serde_json::json;

use unlock_wallet_core::{
    ContractCall, ContractKind, ContractVersion, GatewayError, LockOperations, RpcSender,
    TransactionType, TransportError,
};

use crate::abi::{encode, eth_call, quantity_to_u64, LockReader, UnlockReader};

pub fn operations(version: ContractVersion) -> &'static dyn LockOperations {
    match version {
        ContractVersion::V0 => &v0::V0,
        ContractVersion::V01 => &v01::V01,
        ContractVersion::V02 => &v02::V02,
        ContractVersion::V10 => &v10::V10,
    }
}

pub fn operations_for_tag(tag: &str) -> Result<&'static dyn LockOperations, GatewayError> {
    ContractVersion::from_tag(tag).map(operations)
}

/// Probes `address` for its deployed version.
///
/// Contracts predating the version getter revert or return no data; those are `V0`.
pub async fn detect_version(
    rpc: &dyn RpcSender,
    kind: ContractKind,
    address: Address,
) -> Result<ContractVersion, GatewayError> {
    let code = rpc
        .send("eth_getCode", json!([address.to_string(), "latest"]))
        .await?;
    let deployed = code
        .as_str()
        .map(|c| !c.is_empty() && c != "0x")
        .unwrap_or(false);
    if !deployed {
        return Err(GatewayError::Validation(format!(
            "no contract deployed at {address}"
        )));
    }

    let probe = match kind {
        ContractKind::Unlock => eth_call(rpc, address, UnlockReader::unlockVersionCall {})
            .await
            .map(|r| r._0),
        ContractKind::PublicLock => eth_call(rpc, address, LockReader::publicLockVersionCall {})
            .await
            .map(|r| r._0),
    };
    let number = match probe {
        Ok(n) => quantity_to_u64(n, "contract version")?,
        Err(GatewayError::Transport(TransportError::Rpc(_)))
        | Err(GatewayError::InvalidResponse(_)) => 0,
        Err(err) => return Err(err),
    };
    let version = ContractVersion::from_contract_version(number)?;
    tracing::debug!(%address, ?kind, %version, "contract version detected");
    Ok(version)
}

/// Caches the detected version per contract for the life of a connection.
#[derive(Debug, Default)]
pub struct VersionRegistry {
    cache: Mutex<HashMap<(ContractKind, Address), ContractVersion>>,
}

impl VersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn resolve(
        &self,
        rpc: &dyn RpcSender,
        kind: ContractKind,
        address: Address,
    ) -> Result<ContractVersion, GatewayError> {
        if let Some(version) = self.cached(kind, address) {
            return Ok(version);
        }
        let version = detect_version(rpc, kind, address).await?;
        self.pin(kind, address, version);
        Ok(version)
    }

    pub async fn operations_for(
        &self,
        rpc: &dyn RpcSender,
        kind: ContractKind,
        address: Address,
    ) -> Result<&'static dyn LockOperations, GatewayError> {
        self.resolve(rpc, kind, address).await.map(operations)
    }

    /// Records a known version, skipping detection for `address`.
    pub fn pin(&self, kind: ContractKind, address: Address, version: ContractVersion) {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((kind, address), version);
    }

    pub fn cached(&self, kind: ContractKind, address: Address) -> Option<ContractVersion> {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(kind, address))
            .copied()
    }

    pub fn clear(&self) {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

pub(crate) fn contract_call<C: SolCall>(
    from: Address,
    to: Address,
    call: &C,
    gas: u64,
    value: U256,
    kind: TransactionType,
) -> ContractCall {
    ContractCall {
        from,
        to,
        data: encode(call),
        gas,
        value,
        kind,
    }
}

/// Rejects ERC-20 currencies on versions that only price in ether.
pub(crate) fn require_native(
    version: ContractVersion,
    currency: Option<Address>,
) -> Result<(), GatewayError> {
    match currency {
        Some(token) if token != Address::ZERO && !version.supports_erc20() => {
            Err(GatewayError::Validation(format!(
                "{version} locks cannot be priced in ERC-20 token {token}"
            )))
        }
        _ => Ok(()),
    }
}

pub(crate) fn token_or_native(currency: Option<Address>) -> Address {
    currency.unwrap_or(Address::ZERO)
}

pub(crate) fn max_keys(limit: Option<u64>) -> U256 {
    limit.map(U256::from).unwrap_or(U256::MAX)
}

pub(crate) fn require_amount(amount: Option<&String>) -> Result<&str, GatewayError> {
    amount
        .map(String::as_str)
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| GatewayError::Validation("partial withdrawal needs an amount".to_owned()))
}
