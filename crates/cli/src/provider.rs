use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use eyre::Result;

/// Connect an HTTP provider for the target chain.
pub async fn connect(rpc_url: &str) -> Result<DynProvider> {
    let provider = ProviderBuilder::new().connect(rpc_url).await?;
    Ok(provider.erased())
}

/// Host portion of an RPC URL, used for network detection.
pub fn rpc_host(rpc_url: &str) -> &str {
    let without_scheme = rpc_url
        .split_once("://")
        .map_or(rpc_url, |(_, rest)| rest);
    let without_path = without_scheme
        .split_once('/')
        .map_or(without_scheme, |(host, _)| host);
    without_path
        .rsplit_once(':')
        .map_or(without_path, |(host, _)| host)
}
