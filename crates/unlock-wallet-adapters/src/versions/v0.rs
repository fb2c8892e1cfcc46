//! Original lock contracts: ether-only pricing, `purchaseFor(recipient, data)`.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use unlock_wallet_core::{
    ContractCall, ContractVersion, CreateLockParams, GatewayError, LockOperations, LockSnapshot,
    PurchaseKeyParams, RpcSender, TransactionType, UpdateKeyPriceParams, WithdrawParams,
};

use super::reader::{read_lock, LockLayout, SupplyGetter};
use super::{contract_call, max_keys, require_amount, require_native};
use crate::abi::{gas, to_base_units, PublicLockV0, UnlockV0};

const ETHER_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Copy, Default)]
pub struct V0;

#[async_trait]
impl LockOperations for V0 {
    fn version(&self) -> ContractVersion {
        ContractVersion::V0
    }

    fn create_lock(
        &self,
        unlock: Address,
        from: Address,
        params: &CreateLockParams,
    ) -> Result<ContractCall, GatewayError> {
        require_native(self.version(), params.currency_contract_address)?;
        let call = UnlockV0::createLockCall {
            expirationDuration: U256::from(params.expiration_duration),
            keyPrice: to_base_units(&params.key_price, ETHER_DECIMALS)?,
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
        require_native(self.version(), params.currency_contract_address)?;
        let value = to_base_units(&params.key_price, ETHER_DECIMALS)?;
        let call = PublicLockV0::purchaseForCall {
            recipient: params.owner,
            data: params.data.clone(),
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
            &PublicLockV0::withdrawCall {},
            gas::WITHDRAW,
            U256::ZERO,
            TransactionType::Withdrawal,
        ))
    }

    fn partial_withdraw_from_lock(
        &self,
        params: &WithdrawParams,
    ) -> Result<ContractCall, GatewayError> {
        let amount = to_base_units(require_amount(params.amount.as_ref())?, ETHER_DECIMALS)?;
        Ok(contract_call(
            params.account,
            params.lock,
            &PublicLockV0::partialWithdrawCall { amount },
            gas::PARTIAL_WITHDRAW,
            U256::ZERO,
            TransactionType::Withdrawal,
        ))
    }

    fn update_key_price(
        &self,
        params: &UpdateKeyPriceParams,
    ) -> Result<ContractCall, GatewayError> {
        require_native(self.version(), params.currency_contract_address)?;
        let call = PublicLockV0::updateKeyPriceCall {
            keyPrice: to_base_units(&params.key_price, ETHER_DECIMALS)?,
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
            erc20: false,
            reports_version: false,
        };
        read_lock(rpc, lock, layout).await
    }
}
