//! 1.0 contracts: named locks created with a salt, `purchase` with an
//! explicit value and referrer, token-aware withdrawals and pricing.

use alloy::primitives::{keccak256, Address, FixedBytes, U256};
use async_trait::async_trait;

use unlock_wallet_core::{
    ContractCall, ContractVersion, CreateLockParams, GatewayError, LockOperations, LockSnapshot,
    PurchaseKeyParams, RpcSender, TransactionType, UpdateKeyPriceParams, WithdrawParams,
};

use super::reader::{read_lock, LockLayout, SupplyGetter};
use super::{contract_call, max_keys, require_amount, token_or_native};
use crate::abi::{gas, to_base_units, PublicLockV10, UnlockV10};

#[derive(Debug, Clone, Copy, Default)]
pub struct V10;

/// Deterministic salt derived from the creator, name and duration.
pub fn lock_salt(from: Address, name: &str, expiration_duration: u64) -> FixedBytes<12> {
    let mut preimage = Vec::with_capacity(20 + name.len() + 8);
    preimage.extend_from_slice(from.as_slice());
    preimage.extend_from_slice(name.as_bytes());
    preimage.extend_from_slice(&expiration_duration.to_be_bytes());
    FixedBytes::from_slice(&keccak256(&preimage)[..12])
}

#[async_trait]
impl LockOperations for V10 {
    fn version(&self) -> ContractVersion {
        ContractVersion::V10
    }

    fn create_lock(
        &self,
        unlock: Address,
        from: Address,
        params: &CreateLockParams,
    ) -> Result<ContractCall, GatewayError> {
        let call = UnlockV10::createLockCall {
            expirationDuration: U256::from(params.expiration_duration),
            tokenAddress: token_or_native(params.currency_contract_address),
            keyPrice: to_base_units(&params.key_price, params.currency_decimals)?,
            maxNumberOfKeys: max_keys(params.max_number_of_keys),
            lockName: params.name.clone(),
            salt: lock_salt(from, &params.name, params.expiration_duration),
        };
        Ok(contract_call(
            from,
            unlock,
            &call,
            gas::CREATE_LOCK,
            U256::ZERO,
            TransactionType::LockCreation,
        ))
    }

    fn purchase_key(
        &self,
        from: Address,
        params: &PurchaseKeyParams,
    ) -> Result<ContractCall, GatewayError> {
        let price = to_base_units(&params.key_price, params.currency_decimals)?;
        let native = token_or_native(params.currency_contract_address) == Address::ZERO;
        let call = PublicLockV10::purchaseCall {
            value: price,
            recipient: params.owner,
            referrer: params.referrer.unwrap_or(Address::ZERO),
            data: params.data.clone(),
        };
        Ok(contract_call(
            from,
            params.lock,
            &call,
            gas::PURCHASE_KEY,
            if native { price } else { U256::ZERO },
            TransactionType::KeyPurchase,
        ))
    }

    /// Amount zero withdraws the whole balance.
    fn withdraw_from_lock(&self, params: &WithdrawParams) -> Result<ContractCall, GatewayError> {
        let call = PublicLockV10::withdrawCall {
            tokenAddress: token_or_native(params.currency_contract_address),
            amount: U256::ZERO,
        };
        Ok(contract_call(
            params.account,
            params.lock,
            &call,
            gas::WITHDRAW,
            U256::ZERO,
            TransactionType::Withdrawal,
        ))
    }

    fn partial_withdraw_from_lock(
        &self,
        params: &WithdrawParams,
    ) -> Result<ContractCall, GatewayError> {
        let amount = to_base_units(
            require_amount(params.amount.as_ref())?,
            params.currency_decimals,
        )?;
        let call = PublicLockV10::withdrawCall {
            tokenAddress: token_or_native(params.currency_contract_address),
            amount,
        };
        Ok(contract_call(
            params.account,
            params.lock,
            &call,
            gas::PARTIAL_WITHDRAW,
            U256::ZERO,
            TransactionType::Withdrawal,
        ))
    }

    fn update_key_price(
        &self,
        params: &UpdateKeyPriceParams,
    ) -> Result<ContractCall, GatewayError> {
        let call = PublicLockV10::updateKeyPricingCall {
            keyPrice: to_base_units(&params.key_price, params.currency_decimals)?,
            tokenAddress: token_or_native(params.currency_contract_address),
        };
        Ok(contract_call(
            params.account,
            params.lock,
            &call,
            gas::UPDATE_KEY_PRICE,
            U256::ZERO,
            TransactionType::UpdateKeyPrice,
        ))
    }

    async fn get_lock(
        &self,
        rpc: &dyn RpcSender,
        lock: Address,
    ) -> Result<LockSnapshot, GatewayError> {
        let layout = LockLayout {
            supply: SupplyGetter::TotalSupply,
            erc20: true,
            reports_version: true,
        };
        read_lock(rpc, lock, layout).await
    }
}
