//! Contract interfaces for every supported version, plus the encoding helpers
//! shared by the version implementations.

use alloy::primitives::utils::{format_units, parse_units, ParseUnits};
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use serde_json::{json, Value};

use unlock_wallet_core::{GatewayError, RpcSender};

sol! {
    interface UnlockV0 {
        function createLock(uint256 expirationDuration, uint256 keyPrice, uint256 maxNumberOfKeys) external returns (address);
    }

    interface UnlockV02 {
        function createLock(uint256 expirationDuration, address tokenAddress, uint256 keyPrice, uint256 maxNumberOfKeys) external returns (address);
    }

    interface UnlockV10 {
        function createLock(uint256 expirationDuration, address tokenAddress, uint256 keyPrice, uint256 maxNumberOfKeys, string lockName, bytes12 salt) external returns (address);
    }

    interface PublicLockV0 {
        function purchaseFor(address recipient, bytes data) external payable;
        function withdraw() external;
        function partialWithdraw(uint256 amount) external;
        function updateKeyPrice(uint256 keyPrice) external;
    }

    interface PublicLockV01 {
        function purchaseFor(address recipient) external payable;
        function withdraw() external;
        function partialWithdraw(uint256 amount) external;
        function updateKeyPrice(uint256 keyPrice) external;
    }

    interface PublicLockV10 {
        function purchase(uint256 value, address recipient, address referrer, bytes data) external payable;
        function withdraw(address tokenAddress, uint256 amount) external;
        function updateKeyPricing(uint256 keyPrice, address tokenAddress) external;
    }

    interface LockReader {
        function keyPrice() external view returns (uint256);
        function expirationDuration() external view returns (uint256);
        function maxNumberOfKeys() external view returns (uint256);
        function owner() external view returns (address);
        function outstandingKeys() external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function tokenAddress() external view returns (address);
        function publicLockVersion() external view returns (uint256);
    }

    interface UnlockReader {
        function unlockVersion() external view returns (uint256);
    }

    interface Erc20 {
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
    }
}

pub mod gas {
    pub const CREATE_LOCK: u64 = 3_000_000;
    pub const PURCHASE_KEY: u64 = 300_000;
    pub const WITHDRAW: u64 = 1_000_000;
    pub const PARTIAL_WITHDRAW: u64 = 1_000_000;
    pub const UPDATE_KEY_PRICE: u64 = 1_000_000;
}

pub fn encode<C: SolCall>(call: &C) -> Bytes {
    Bytes::from(call.abi_encode())
}

/// Read-only `eth_call` against `to` at the latest block.
pub async fn eth_call<C>(rpc: &dyn RpcSender, to: Address, call: C) -> Result<C::Return, GatewayError>
where
    C: SolCall + Send,
{
    let data = format!("0x{}", alloy::hex::encode(call.abi_encode()));
    let raw = rpc
        .send(
            "eth_call",
            json!([{ "to": to.to_string(), "data": data }, "latest"]),
        )
        .await?;
    let bytes = parse_bytes(&raw)?;
    C::abi_decode_returns(&bytes, true).map_err(|e| {
        GatewayError::InvalidResponse(format!("cannot decode {} result: {e}", C::SIGNATURE))
    })
}

pub fn parse_bytes(value: &Value) -> Result<Bytes, GatewayError> {
    let raw = value
        .as_str()
        .ok_or_else(|| GatewayError::InvalidResponse("expected hex data string".to_owned()))?;
    raw.parse()
        .map_err(|e| GatewayError::InvalidResponse(format!("invalid hex data: {e}")))
}

/// Parses an RPC quantity (`"0x1a"`), tolerating plain numbers from lenient nodes.
pub fn parse_quantity(value: &Value) -> Result<U256, GatewayError> {
    if let Some(n) = value.as_u64() {
        return Ok(U256::from(n));
    }
    let raw = value
        .as_str()
        .ok_or_else(|| GatewayError::InvalidResponse("expected quantity string".to_owned()))?;
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some("") => return Ok(U256::ZERO),
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(raw, 10),
    };
    parsed.map_err(|e| GatewayError::InvalidResponse(format!("invalid quantity '{raw}': {e}")))
}

pub fn quantity_to_u64(value: U256, field: &str) -> Result<u64, GatewayError> {
    u64::try_from(value)
        .map_err(|_| GatewayError::InvalidResponse(format!("{field} does not fit in u64")))
}

/// Converts a decimal amount (`"0.01"`) to base units.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<U256, GatewayError> {
    match parse_units(amount.trim(), decimals) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Err(GatewayError::Validation(format!(
            "amount must not be negative: {amount}"
        ))),
        Err(e) => Err(GatewayError::Validation(format!(
            "invalid amount '{amount}': {e}"
        ))),
    }
}

/// Formats base units as a decimal string without trailing zeros.
pub fn from_base_units(value: U256, decimals: u8) -> Result<String, GatewayError> {
    let formatted = format_units(value, decimals)
        .map_err(|e| GatewayError::InvalidResponse(format!("cannot format amount: {e}")))?;
    Ok(trim_decimal(&formatted))
}

fn trim_decimal(raw: &str) -> String {
    if !raw.contains('.') {
        return raw.to_owned();
    }
    raw.trim_end_matches('0').trim_end_matches('.').to_owned()
}
