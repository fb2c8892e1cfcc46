use crate::domain::TransactionStatus;
use crate::ports::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxAction {
    /// Node reports the transaction in its mempool.
    Broadcast,
    /// Receipt with a success status.
    Mine,
    /// Receipt with a failure status, or the node dropped it.
    Fail,
}

pub fn tx_transition(
    from: TransactionStatus,
    action: TxAction,
) -> Result<(TransactionStatus, &'static str), GatewayError> {
    use TransactionStatus::*;
    let next = match (from, action) {
        (Submitted, TxAction::Broadcast) => (Pending, "seen_in_mempool"),
        (Submitted, TxAction::Mine) | (Pending, TxAction::Mine) => (Mined, "receipt_success"),
        (Submitted, TxAction::Fail) | (Pending, TxAction::Fail) => (Failed, "receipt_failure"),
        _ => {
            return Err(GatewayError::Validation(format!(
                "illegal tx transition: {from:?} via {action:?}"
            )))
        }
    };
    Ok(next)
}

/// Lifecycle of one dispatched provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Created,
    Sent,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallAction {
    Send,
    Succeed,
    Fail,
}

pub fn call_transition(from: CallState, action: CallAction) -> Result<CallState, GatewayError> {
    match (from, action) {
        (CallState::Created, CallAction::Send) => Ok(CallState::Sent),
        (CallState::Sent, CallAction::Succeed) => Ok(CallState::Succeeded),
        (CallState::Sent, CallAction::Fail) => Ok(CallState::Failed),
        _ => Err(GatewayError::Validation(format!(
            "illegal call transition: {from:?} via {action:?}"
        ))),
    }
}
