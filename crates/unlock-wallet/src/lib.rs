//! Version-dispatching transaction gateway for Unlock lock contracts.

pub mod callback;
pub mod service;

pub use callback::{forward_events, with_callback};
pub use service::WalletService;

pub use unlock_wallet_adapters::{ConnectionDescriptor, RelayHost, WalletConfig, WalletProvider};
pub use unlock_wallet_core::{
    ContractVersion, CreateLockParams, GatewayError, GatewayEvent, LockSnapshot,
    PurchaseKeyParams, Transaction, TransactionStatus, TransactionType, UpdateKeyPriceParams,
    WalletInfo, WithdrawParams,
};
