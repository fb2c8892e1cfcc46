//! 0.2 contracts add ERC-20 pricing. Token purchases carry no ether; the
//! buyer approves the lock beforehand.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use unlock_wallet_core::{
    ContractCall, ContractVersion, CreateLockParams, GatewayError, LockOperations, LockSnapshot,
    PurchaseKeyParams, RpcSender, TransactionType, UpdateKeyPriceParams, WithdrawParams,
};

use super::reader::{read_lock, LockLayout, SupplyGetter};
use super::{contract_call, max_keys, require_amount, token_or_native};
use crate::abi::{gas, to_base_units, PublicLockV01, UnlockV02};

#[derive(Debug, Clone, Copy, Default)]
pub struct V02;

#[async_trait]
impl LockOperations for V02 {
    fn version(&self) -> ContractVersion {
        ContractVersion::V02
    }

    fn create_lock(
        &self,
        unlock: Address,
        from: Address,
        params: &CreateLockParams,
    ) -> Result<ContractCall, GatewayError> {
        let call = UnlockV02::createLockCall {
            expirationDuration: U256::from(params.expiration_duration),
            tokenAddress: token_or_native(params.currency_contract_address),
            keyPrice: to_base_units(&params.key_price, params.currency_decimals)?,
            maxNumberOfKeys: max_keys(params.max_number_of_keys),
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
        let value = if token_or_native(params.currency_contract_address) == Address::ZERO {
            price
        } else {
            U256::ZERO
        };
        let call = PublicLockV01::purchaseForCall {
            recipient: params.owner,
        };
        Ok(contract_call(
            from,
            params.lock,
            &call,
            gas::PURCHASE_KEY,
            value,
            TransactionType::KeyPurchase,
        ))
    }

    fn withdraw_from_lock(&self, params: &WithdrawParams) -> Result<ContractCall, GatewayError> {
        Ok(contract_call(
            params.account,
            params.lock,
            &PublicLockV01::withdrawCall {},
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
        Ok(contract_call(
            params.account,
            params.lock,
            &PublicLockV01::partialWithdrawCall { amount },
            gas::PARTIAL_WITHDRAW,
            U256::ZERO,
            TransactionType::Withdrawal,
        ))
    }

    fn update_key_price(
        &self,
        params: &UpdateKeyPriceParams,
    ) -> Result<ContractCall, GatewayError> {
        let call = PublicLockV01::updateKeyPriceCall {
            keyPrice: to_base_units(&params.key_price, params.currency_decimals)?,
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
            supply: SupplyGetter::OutstandingKeys,
            erc20: true,
            reports_version: true,
        };
        read_lock(rpc, lock, layout).await
    }
}
