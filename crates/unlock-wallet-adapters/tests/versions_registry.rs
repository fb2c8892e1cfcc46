mod common;

use std::io;
use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use serde_json::json;

use common::{account, lock_address, lock_chain, token_address, LockFixture, ScriptedSender};
use unlock_wallet_adapters::abi::{gas, PublicLockV0, PublicLockV10, UnlockV10};
use unlock_wallet_adapters::versions::{detect_version, operations, operations_for_tag, v10};
use unlock_wallet_adapters::VersionRegistry;
use unlock_wallet_core::{
    ContractKind, ContractVersion, CreateLockParams, GatewayError, PurchaseKeyParams,
    TransactionType, TransportError, UpdateKeyPriceParams, WithdrawParams, UNLIMITED_KEYS_COUNT,
};

fn create_params(currency: Option<Address>) -> CreateLockParams {
    CreateLockParams {
        expiration_duration: 2_592_000,
        key_price: "0.01".to_owned(),
        max_number_of_keys: None,
        currency_contract_address: currency,
        currency_decimals: 18,
        name: "Members".to_owned(),
    }
}

#[test]
fn every_version_exposes_every_operation() {
    let unlock = Address::repeat_byte(0x55);
    for version in ContractVersion::ALL {
        let ops = operations(version);
        assert_eq!(ops.version(), version);

        let created = ops
            .create_lock(unlock, account(), &create_params(None))
            .expect("create lock");
        assert_eq!(created.kind, TransactionType::LockCreation);
        assert_eq!(created.to, unlock);
        assert_eq!(created.gas, gas::CREATE_LOCK);

        let purchase = ops
            .purchase_key(account(), &PurchaseKeyParams::new(lock_address(), account(), "0.01"))
            .expect("purchase");
        assert_eq!(purchase.kind, TransactionType::KeyPurchase);
        assert_eq!(purchase.value, U256::from(10_000_000_000_000_000u64));

        let withdraw = ops
            .withdraw_from_lock(&WithdrawParams::full(lock_address(), account()))
            .expect("withdraw");
        assert_eq!(withdraw.kind, TransactionType::Withdrawal);
        assert_eq!(withdraw.from, account());

        let partial = ops
            .partial_withdraw_from_lock(&WithdrawParams::partial(lock_address(), account(), "0.5"))
            .expect("partial withdraw");
        assert_eq!(partial.gas, gas::PARTIAL_WITHDRAW);

        let update = ops
            .update_key_price(&UpdateKeyPriceParams {
                lock: lock_address(),
                account: account(),
                key_price: "0.02".to_owned(),
                currency_contract_address: None,
                currency_decimals: 18,
            })
            .expect("update key price");
        assert_eq!(update.kind, TransactionType::UpdateKeyPrice);

        for call in [&created, &purchase, &withdraw, &partial, &update] {
            assert!(call.data.len() >= 4, "{version} produced empty call data");
        }
    }
}

#[test]
fn unknown_version_tags_are_unsupported() {
    assert!(operations_for_tag("V02").is_ok());
    match operations_for_tag("v7") {
        Err(GatewayError::UnsupportedVersion(tag)) => assert_eq!(tag, "v7"),
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("v7 should not resolve"),
    }
}

#[test]
fn v0_purchase_encodes_recipient_and_data() {
    let mut params = PurchaseKeyParams::new(lock_address(), account(), "0.01");
    params.data = Bytes::from_static(b"hi");

    let call = operations(ContractVersion::V0)
        .purchase_key(account(), &params)
        .expect("purchase");
    let expected = PublicLockV0::purchaseForCall {
        recipient: account(),
        data: Bytes::from_static(b"hi"),
    };
    assert_eq!(call.data, Bytes::from(expected.abi_encode()));
    assert_eq!(call.to, lock_address());
    assert_eq!(call.gas, gas::PURCHASE_KEY);
}

#[test]
fn ether_only_versions_reject_token_currencies() {
    for version in [ContractVersion::V0, ContractVersion::V01] {
        let err = operations(version)
            .create_lock(Address::ZERO, account(), &create_params(Some(token_address())))
            .expect_err("erc20 lock");
        assert!(matches!(err, GatewayError::Validation(_)));
    }
    assert!(operations(ContractVersion::V02)
        .create_lock(Address::ZERO, account(), &create_params(Some(token_address())))
        .is_ok());
}

#[test]
fn v10_token_purchase_sends_no_ether() {
    let mut params = PurchaseKeyParams::new(lock_address(), account(), "1.5");
    params.currency_contract_address = Some(token_address());
    params.currency_decimals = 6;
    params.referrer = Some(Address::repeat_byte(0x77));

    let call = operations(ContractVersion::V10)
        .purchase_key(account(), &params)
        .expect("purchase");
    assert_eq!(call.value, U256::ZERO);

    let decoded = PublicLockV10::purchaseCall::abi_decode(&call.data, true).expect("decode");
    assert_eq!(decoded.value, U256::from(1_500_000u64));
    assert_eq!(decoded.recipient, account());
    assert_eq!(decoded.referrer, Address::repeat_byte(0x77));
}

#[test]
fn v10_lock_creation_carries_name_and_salt() {
    let call = operations(ContractVersion::V10)
        .create_lock(Address::repeat_byte(0x55), account(), &create_params(None))
        .expect("create");
    let decoded = UnlockV10::createLockCall::abi_decode(&call.data, true).expect("decode");
    assert_eq!(decoded.lockName, "Members");
    assert_eq!(decoded.maxNumberOfKeys, U256::MAX);
    assert_eq!(decoded.tokenAddress, Address::ZERO);
    assert_eq!(decoded.salt, v10::lock_salt(account(), "Members", 2_592_000));
    assert_ne!(
        v10::lock_salt(account(), "Members", 2_592_000),
        v10::lock_salt(account(), "Members", 86_400)
    );
}

#[test]
fn partial_withdrawal_requires_an_amount() {
    for version in ContractVersion::ALL {
        let err = operations(version)
            .partial_withdraw_from_lock(&WithdrawParams::full(lock_address(), account()))
            .expect_err("no amount");
        assert!(matches!(err, GatewayError::Validation(_)));
    }
}

#[tokio::test]
async fn version_probe_maps_contract_numbers() {
    let legacy = lock_chain(LockFixture::default());
    assert_eq!(
        detect_version(&legacy, ContractKind::PublicLock, lock_address())
            .await
            .expect("legacy"),
        ContractVersion::V0
    );

    let current = lock_chain(LockFixture {
        version_number: Some(3),
        ..LockFixture::default()
    });
    assert_eq!(
        detect_version(&current, ContractKind::Unlock, lock_address())
            .await
            .expect("current"),
        ContractVersion::V10
    );

    let future = lock_chain(LockFixture {
        version_number: Some(9),
        ..LockFixture::default()
    });
    assert!(matches!(
        detect_version(&future, ContractKind::PublicLock, lock_address()).await,
        Err(GatewayError::UnsupportedVersion(_))
    ));
}

#[tokio::test]
async fn missing_contract_is_a_validation_error() {
    let empty = ScriptedSender::new(|method, _| {
        assert_eq!(method, "eth_getCode");
        Ok(json!("0x"))
    });
    let err = detect_version(&empty, ContractKind::Unlock, lock_address())
        .await
        .expect_err("no code");
    assert!(matches!(err, GatewayError::Validation(_)));
}

#[tokio::test]
async fn probe_network_failures_propagate() {
    let original: Arc<dyn std::error::Error + Send + Sync> =
        Arc::new(io::Error::new(io::ErrorKind::TimedOut, "node timed out"));
    let shared = Arc::clone(&original);
    let flaky = ScriptedSender::new(move |method, _| match method {
        "eth_getCode" => Ok(json!("0x6080")),
        _ => Err(TransportError::Network(Arc::clone(&shared)).into()),
    });

    match detect_version(&flaky, ContractKind::PublicLock, lock_address()).await {
        Err(GatewayError::Transport(TransportError::Network(err))) => {
            assert!(Arc::ptr_eq(&err, &original))
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn registry_caches_until_cleared() {
    let node = lock_chain(LockFixture {
        version_number: Some(2),
        ..LockFixture::default()
    });
    let registry = VersionRegistry::new();

    for _ in 0..3 {
        let version = registry
            .resolve(&node, ContractKind::PublicLock, lock_address())
            .await
            .expect("resolve");
        assert_eq!(version, ContractVersion::V02);
    }
    assert_eq!(node.count("eth_getCode"), 1);
    assert_eq!(
        registry.cached(ContractKind::PublicLock, lock_address()),
        Some(ContractVersion::V02)
    );
    assert_eq!(registry.cached(ContractKind::Unlock, lock_address()), None);

    registry.clear();
    let ops = registry
        .operations_for(&node, ContractKind::PublicLock, lock_address())
        .await
        .expect("operations");
    assert_eq!(ops.version(), ContractVersion::V02);
    assert_eq!(node.count("eth_getCode"), 2);
}

#[tokio::test]
async fn v0_snapshot_uses_native_balance_and_unlimited_keys() {
    let node = lock_chain(LockFixture::default());
    let snapshot = operations(ContractVersion::V0)
        .get_lock(&node, lock_address())
        .await
        .expect("snapshot");

    assert_eq!(snapshot.key_price, "0.01");
    assert_eq!(snapshot.balance, "0.03");
    assert_eq!(snapshot.expiration_duration, 2_592_000);
    assert_eq!(snapshot.max_number_of_keys, UNLIMITED_KEYS_COUNT);
    assert_eq!(snapshot.outstanding_keys, 3);
    assert_eq!(snapshot.owner, account());
    assert_eq!(snapshot.currency_contract_address, None);
    assert_eq!(snapshot.public_lock_version, None);
    assert_eq!(snapshot.as_of, 16);
    assert_eq!(node.count("eth_getBalance"), 1);
}

#[tokio::test]
async fn v10_snapshot_reads_token_balance_and_total_supply() {
    let node = lock_chain(LockFixture {
        version_number: Some(3),
        key_price: U256::from(1_500_000u64),
        max_keys: U256::from(100u64),
        token: token_address(),
        token_decimals: 6,
        balance: U256::from(4_500_000u64),
        ..LockFixture::default()
    });
    let snapshot = operations(ContractVersion::V10)
        .get_lock(&node, lock_address())
        .await
        .expect("snapshot");

    assert_eq!(snapshot.key_price, "1.5");
    assert_eq!(snapshot.balance, "4.5");
    assert_eq!(snapshot.max_number_of_keys, 100);
    assert_eq!(snapshot.outstanding_keys, 5);
    assert_eq!(snapshot.currency_contract_address, Some(token_address()));
    assert_eq!(snapshot.public_lock_version, Some(3));
    assert_eq!(node.count("eth_getBalance"), 0);
}
