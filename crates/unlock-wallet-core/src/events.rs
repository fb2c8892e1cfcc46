//! Typed lifecycle events delivered to UI-side consumers.

use alloy::primitives::{Address, B256};
use tokio::sync::broadcast;

use crate::domain::{LockSnapshot, Transaction, TransactionStatus, TransactionType, WalletInfo};
use crate::ports::GatewayError;

#[derive(Debug, Clone)]
pub enum GatewayEvent {
    AccountChanged(Address),
    NetworkChanged(u64),
    TransactionPending(TransactionType),
    TransactionNew(Transaction),
    TransactionUpdated {
        hash: B256,
        status: TransactionStatus,
    },
    LockUpdated {
        address: Address,
        snapshot: LockSnapshot,
    },
    WalletInfo(WalletInfo),
    Ready,
    Error(GatewayError),
}

impl GatewayEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GatewayEvent::AccountChanged(_) => "account.changed",
            GatewayEvent::NetworkChanged(_) => "network.changed",
            GatewayEvent::TransactionPending(_) => "transaction.pending",
            GatewayEvent::TransactionNew(_) => "transaction.new",
            GatewayEvent::TransactionUpdated { .. } => "transaction.updated",
            GatewayEvent::LockUpdated { .. } => "lock.updated",
            GatewayEvent::WalletInfo(_) => "wallet.info",
            GatewayEvent::Ready => "ready",
            GatewayEvent::Error(_) => "error",
        }
    }
}

/// Outbound event channel. Subscribers never affect the sender.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<GatewayEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: GatewayEvent) {
        tracing::trace!(event = event.name(), "emit");
        // No subscribers is a normal state.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
