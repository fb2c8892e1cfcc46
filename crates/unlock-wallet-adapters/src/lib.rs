pub mod abi;
pub mod config;
pub mod provider;
pub mod relay;
pub mod rpc;
pub mod signing;
pub mod versions;

pub use config::{RuntimeProfile, WalletConfig};
pub use provider::{ConnectionDescriptor, ProviderAdapter, WalletProvider};
pub use relay::{
    relay_channel, validate_method_call, RelayChannel, RelayHost, RelayMessage, RelayReply,
    RelayRequest, WALLET_INFO_METHOD,
};
pub use rpc::HttpTransport;
pub use signing::SigningFacade;
pub use versions::{operations, VersionRegistry};
