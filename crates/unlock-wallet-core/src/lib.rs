pub mod domain;
pub mod events;
pub mod ports;
pub mod state_machine;
pub mod tracker;

pub use domain::{
    ContractCall, ContractKind, ContractVersion, CreateLockParams, LockSnapshot,
    PurchaseKeyParams, SentTransaction, Transaction, TransactionStatus, TransactionType,
    UpdateKeyPriceParams, WalletFlavor, WalletInfo, WithdrawParams, UNLIMITED_KEYS_COUNT,
};
pub use events::{EventBus, GatewayEvent};
pub use ports::{
    GatewayError, JsonRpcRequest, JsonRpcResponse, LockOperations, RpcErrorObject, RpcSender,
    TransportError,
};
pub use state_machine::{call_transition, tx_transition, CallAction, CallState, TxAction};
pub use tracker::{ChainObservation, TransactionTracker};
