use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ports::GatewayError;

/// Value reported for `max_number_of_keys` when a lock sells an unbounded number of keys.
pub const UNLIMITED_KEYS_COUNT: i64 = -1;

/// Deployed ABI version of an Unlock or PublicLock contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractVersion {
    V0,
    V01,
    V02,
    V10,
}

impl ContractVersion {
    pub const ALL: [ContractVersion; 4] = [
        ContractVersion::V0,
        ContractVersion::V01,
        ContractVersion::V02,
        ContractVersion::V10,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            ContractVersion::V0 => "v0",
            ContractVersion::V01 => "v01",
            ContractVersion::V02 => "v02",
            ContractVersion::V10 => "v10",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, GatewayError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "v0" => Ok(ContractVersion::V0),
            "v01" => Ok(ContractVersion::V01),
            "v02" => Ok(ContractVersion::V02),
            "v10" => Ok(ContractVersion::V10),
            other => Err(GatewayError::UnsupportedVersion(other.to_owned())),
        }
    }

    /// Maps the number returned by `publicLockVersion()` / `unlockVersion()`.
    pub fn from_contract_version(version: u64) -> Result<Self, GatewayError> {
        match version {
            0 => Ok(ContractVersion::V0),
            1 => Ok(ContractVersion::V01),
            2 => Ok(ContractVersion::V02),
            3 => Ok(ContractVersion::V10),
            other => Err(GatewayError::UnsupportedVersion(other.to_string())),
        }
    }

    pub fn supports_erc20(self) -> bool {
        matches!(self, ContractVersion::V02 | ContractVersion::V10)
    }
}

impl fmt::Display for ContractVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ContractVersion {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s)
    }
}

/// Which contract a version probe targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    Unlock,
    PublicLock,
}

/// Caller-facing tag used to correlate transactions in UI layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    LockCreation,
    KeyPurchase,
    Withdrawal,
    UpdateKeyPrice,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::LockCreation => "LOCK_CREATION",
            TransactionType::KeyPurchase => "KEY_PURCHASE",
            TransactionType::Withdrawal => "WITHDRAWAL",
            TransactionType::UpdateKeyPrice => "UPDATE_KEY_PRICE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Submitted,
    Pending,
    Mined,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Submitted => "submitted",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Mined => "mined",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn is_final(self) -> bool {
        matches!(self, TransactionStatus::Mined | TransactionStatus::Failed)
    }
}

/// What a chain operation yields once the provider accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransaction {
    pub hash: B256,
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: B256,
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub block_number: Option<u64>,
}

/// Fully encoded state-changing call produced by a version implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub gas: u64,
    pub value: U256,
    pub kind: TransactionType,
}

impl ContractCall {
    /// `eth_sendTransaction` parameter object.
    pub fn to_request_json(&self) -> Value {
        serde_json::json!({
            "from": self.from.to_string(),
            "to": self.to.to_string(),
            "data": format!("0x{}", alloy::hex::encode(&self.data)),
            "gas": format!("0x{:x}", self.gas),
            "value": format!("0x{:x}", self.value),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLockParams {
    pub expiration_duration: u64,
    /// Decimal amount in the lock currency, e.g. `"0.01"`.
    pub key_price: String,
    /// `None` sells unlimited keys.
    pub max_number_of_keys: Option<u64>,
    pub currency_contract_address: Option<Address>,
    pub currency_decimals: u8,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseKeyParams {
    pub lock: Address,
    pub owner: Address,
    pub key_price: String,
    pub data: Bytes,
    pub referrer: Option<Address>,
    pub currency_contract_address: Option<Address>,
    pub currency_decimals: u8,
}

impl PurchaseKeyParams {
    pub fn new(lock: Address, owner: Address, key_price: impl Into<String>) -> Self {
        Self {
            lock,
            owner,
            key_price: key_price.into(),
            data: Bytes::new(),
            referrer: None,
            currency_contract_address: None,
            currency_decimals: 18,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawParams {
    pub lock: Address,
    pub account: Address,
    /// Required for partial withdrawals, ignored otherwise.
    pub amount: Option<String>,
    pub currency_contract_address: Option<Address>,
    pub currency_decimals: u8,
}

impl WithdrawParams {
    pub fn full(lock: Address, account: Address) -> Self {
        Self {
            lock,
            account,
            amount: None,
            currency_contract_address: None,
            currency_decimals: 18,
        }
    }

    pub fn partial(lock: Address, account: Address, amount: impl Into<String>) -> Self {
        Self {
            amount: Some(amount.into()),
            ..Self::full(lock, account)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateKeyPriceParams {
    pub lock: Address,
    pub account: Address,
    pub key_price: String,
    pub currency_contract_address: Option<Address>,
    pub currency_decimals: u8,
}

/// Read-only projection of a lock's on-chain state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockSnapshot {
    pub key_price: String,
    pub expiration_duration: u64,
    pub max_number_of_keys: i64,
    pub owner: Address,
    pub balance: String,
    pub outstanding_keys: u64,
    pub currency_contract_address: Option<Address>,
    pub public_lock_version: Option<u64>,
    pub as_of: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalletFlavor {
    MetaMask,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
    pub no_wallet: bool,
    pub not_enabled: bool,
    pub is_metamask: bool,
}

impl WalletInfo {
    pub fn available(flavor: WalletFlavor) -> Self {
        Self {
            no_wallet: false,
            not_enabled: false,
            is_metamask: flavor == WalletFlavor::MetaMask,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            no_wallet: true,
            not_enabled: false,
            is_metamask: false,
        }
    }

    pub fn flavor(&self) -> WalletFlavor {
        if self.is_metamask {
            WalletFlavor::MetaMask
        } else {
            WalletFlavor::Generic
        }
    }
}
