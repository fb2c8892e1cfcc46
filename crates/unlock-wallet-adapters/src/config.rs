use alloy::primitives::Address;

use unlock_wallet_core::GatewayError;

pub const DEFAULT_LOCAL_RPC_URL: &str = "http://127.0.0.1:8545";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeProfile {
    Development,
    Production,
}

impl RuntimeProfile {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => RuntimeProfile::Production,
            _ => RuntimeProfile::Development,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WalletConfig {
    pub runtime_profile: RuntimeProfile,
    /// Endpoint behind the local-RPC connection sentinel.
    pub provider_url: Option<String>,
    pub unlock_address: Address,
    pub rpc_timeout_ms: u64,
    pub event_capacity: usize,
    pub required_chain_id: Option<u64>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            provider_url: None,
            unlock_address: Address::ZERO,
            rpc_timeout_ms: 15_000,
            event_capacity: 256,
            required_chain_id: None,
        }
    }
}

impl WalletConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(profile) = std::env::var("UNLOCK_RUNTIME_PROFILE") {
            cfg.runtime_profile = RuntimeProfile::parse(&profile);
        }
        if let Ok(url) = std::env::var("UNLOCK_PROVIDER_URL") {
            if !url.trim().is_empty() {
                cfg.provider_url = Some(url.trim().to_owned());
            }
        }
        if let Some(address) = env_parse::<Address>("UNLOCK_CONTRACT_ADDRESS") {
            cfg.unlock_address = address;
        }
        if let Some(timeout) = env_parse::<u64>("UNLOCK_RPC_TIMEOUT_MS") {
            cfg.rpc_timeout_ms = timeout;
        }
        if let Some(capacity) = env_parse::<usize>("UNLOCK_EVENT_CAPACITY") {
            cfg.event_capacity = capacity;
        }
        cfg.required_chain_id = env_parse::<u64>("UNLOCK_REQUIRE_CHAIN_ID");
        cfg
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn is_development(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Development
    }

    /// URL used for the local-RPC sentinel. Production never falls back to localhost.
    pub fn local_rpc_url(&self) -> Result<String, GatewayError> {
        match &self.provider_url {
            Some(url) => Ok(url.clone()),
            None if self.strict_runtime_required() => Err(GatewayError::Config(
                "UNLOCK_PROVIDER_URL not configured in production runtime profile".to_owned(),
            )),
            None => Ok(DEFAULT_LOCAL_RPC_URL.to_owned()),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable config value");
            None
        }
    }
}
