use alloy::primitives::{Address, U256};
use serde_json::json;

use unlock_wallet_core::{GatewayError, LockSnapshot, RpcSender, UNLIMITED_KEYS_COUNT};

use crate::abi::{
    eth_call, from_base_units, parse_quantity, quantity_to_u64, Erc20, LockReader,
};

#[derive(Debug, Clone, Copy)]
pub(crate) enum SupplyGetter {
    OutstandingKeys,
    /// Renamed from `outstandingKeys` in 1.0 contracts.
    TotalSupply,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct LockLayout {
    pub supply: SupplyGetter,
    pub erc20: bool,
    pub reports_version: bool,
}

pub(crate) async fn read_lock(
    rpc: &dyn RpcSender,
    lock: Address,
    layout: LockLayout,
) -> Result<LockSnapshot, GatewayError> {
    let (key_price, expiration, max_keys, owner, supply, as_of) = tokio::try_join!(
        eth_call(rpc, lock, LockReader::keyPriceCall {}),
        eth_call(rpc, lock, LockReader::expirationDurationCall {}),
        eth_call(rpc, lock, LockReader::maxNumberOfKeysCall {}),
        eth_call(rpc, lock, LockReader::ownerCall {}),
        read_supply(rpc, lock, layout.supply),
        block_number(rpc),
    )?;

    let token = if layout.erc20 {
        eth_call(rpc, lock, LockReader::tokenAddressCall {}).await?._0
    } else {
        Address::ZERO
    };
    let public_lock_version = if layout.reports_version {
        let raw = eth_call(rpc, lock, LockReader::publicLockVersionCall {})
            .await?
            ._0;
        Some(quantity_to_u64(raw, "publicLockVersion")?)
    } else {
        None
    };

    let (balance, decimals, currency_contract_address) = if token == Address::ZERO {
        let raw = rpc
            .send("eth_getBalance", json!([lock.to_string(), "latest"]))
            .await?;
        (parse_quantity(&raw)?, 18u8, None)
    } else {
        let (balance, decimals) = tokio::try_join!(
            eth_call(rpc, token, Erc20::balanceOfCall { owner: lock }),
            eth_call(rpc, token, Erc20::decimalsCall {}),
        )?;
        (balance._0, decimals._0, Some(token))
    };

    Ok(LockSnapshot {
        key_price: from_base_units(key_price._0, decimals)?,
        expiration_duration: quantity_to_u64(expiration._0, "expirationDuration")?,
        max_number_of_keys: max_keys_count(max_keys._0)?,
        owner: owner._0,
        balance: from_base_units(balance, decimals)?,
        outstanding_keys: supply,
        currency_contract_address,
        public_lock_version,
        as_of,
    })
}

async fn read_supply(
    rpc: &dyn RpcSender,
    lock: Address,
    getter: SupplyGetter,
) -> Result<u64, GatewayError> {
    let raw = match getter {
        SupplyGetter::OutstandingKeys => {
            eth_call(rpc, lock, LockReader::outstandingKeysCall {})
                .await?
                ._0
        }
        SupplyGetter::TotalSupply => eth_call(rpc, lock, LockReader::totalSupplyCall {}).await?._0,
    };
    quantity_to_u64(raw, "outstandingKeys")
}

async fn block_number(rpc: &dyn RpcSender) -> Result<u64, GatewayError> {
    let raw = rpc.send("eth_blockNumber", json!([])).await?;
    quantity_to_u64(parse_quantity(&raw)?, "blockNumber")
}

/// `2^256 - 1` is how contracts spell "unlimited".
pub(crate) fn max_keys_count(raw: U256) -> Result<i64, GatewayError> {
    if raw == U256::MAX {
        return Ok(UNLIMITED_KEYS_COUNT);
    }
    let count = quantity_to_u64(raw, "maxNumberOfKeys")?;
    i64::try_from(count)
        .map_err(|_| GatewayError::InvalidResponse("maxNumberOfKeys does not fit in i64".to_owned()))
}
