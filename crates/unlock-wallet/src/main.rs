//! unlock-wallet: connects to the configured node and prints wallet and lock state.

use alloy::primitives::Address;
use eyre::{eyre, WrapErr};

use unlock_wallet::{ConnectionDescriptor, WalletConfig, WalletService};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting unlock-wallet");

    let config = WalletConfig::from_env();
    let mut service = WalletService::new(config);

    let info = service
        .connect(ConnectionDescriptor::LocalRpc)
        .await
        .wrap_err("failed to connect to the node")?;
    if info.no_wallet {
        println!("no wallet available");
        return Ok(());
    }
    if let Some(network) = service.network_id() {
        println!("network: {network}");
    }

    match service.get_account().await? {
        Some(account) => println!("account: {account}"),
        None => println!("account: none"),
    }
    println!(
        "unlock contract deployed: {}",
        service.is_unlock_contract_deployed().await?
    );

    for raw in std::env::args().skip(1) {
        let lock: Address = raw
            .parse()
            .map_err(|e| eyre!("invalid lock address '{raw}': {e}"))?;
        let snapshot = service
            .get_lock(lock)
            .await
            .wrap_err_with(|| format!("failed to read lock {lock}"))?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    Ok(())
}
