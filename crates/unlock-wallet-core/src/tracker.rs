//! Wraps state-changing chain operations and reports their lifecycle.

use std::future::Future;

use alloy::primitives::B256;

use crate::domain::{SentTransaction, Transaction, TransactionStatus, TransactionType};
use crate::events::{EventBus, GatewayEvent};
use crate::ports::GatewayError;
use crate::state_machine::{tx_transition, TxAction};

/// What a node currently reports about a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainObservation {
    NotFound,
    InMempool,
    Included { block_number: u64, success: bool },
}

#[derive(Debug, Clone)]
pub struct TransactionTracker {
    events: EventBus,
}

impl TransactionTracker {
    pub fn new(events: EventBus) -> Self {
        Self { events }
    }

    /// Emits `transaction.pending` right away, then exactly one `transaction.new`
    /// once `call` yields a hash. Errors from `call` are returned untouched.
    pub async fn track<F>(&self, kind: TransactionType, call: F) -> Result<Transaction, GatewayError>
    where
        F: Future<Output = Result<SentTransaction, GatewayError>> + Send,
    {
        self.events.emit(GatewayEvent::TransactionPending(kind));

        let sent = call.await?;
        if sent.hash == B256::ZERO {
            return Err(GatewayError::InvalidResponse(
                "provider returned an empty transaction hash".to_owned(),
            ));
        }

        let transaction = Transaction {
            hash: sent.hash,
            from: sent.from,
            to: sent.to,
            data: sent.data,
            kind,
            status: TransactionStatus::Submitted,
            block_number: None,
        };
        self.events
            .emit(GatewayEvent::TransactionNew(transaction.clone()));
        Ok(transaction)
    }

    /// Moves `transaction` forward according to `observation`. Returns whether
    /// the status changed; a change emits `transaction.updated`.
    pub fn observe(
        &self,
        transaction: &mut Transaction,
        observation: ChainObservation,
    ) -> Result<bool, GatewayError> {
        if transaction.status.is_final() {
            return Ok(false);
        }

        let action = match observation {
            ChainObservation::NotFound => return Ok(false),
            ChainObservation::InMempool => {
                if transaction.status == TransactionStatus::Pending {
                    return Ok(false);
                }
                TxAction::Broadcast
            }
            ChainObservation::Included {
                block_number,
                success,
            } => {
                transaction.block_number = Some(block_number);
                if success {
                    TxAction::Mine
                } else {
                    TxAction::Fail
                }
            }
        };

        let (next, reason) = tx_transition(transaction.status, action)?;
        tracing::debug!(hash = %transaction.hash, from = ?transaction.status, to = ?next, reason, "transaction status");
        transaction.status = next;
        self.events.emit(GatewayEvent::TransactionUpdated {
            hash: transaction.hash,
            status: next,
        });
        Ok(true)
    }
}
