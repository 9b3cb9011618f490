use async_trait::async_trait;

use crate::{
    error::MetadataError,
    types::{AuctionMetadata, MetadataDocument},
};

/// Public gateway used when none is configured.
pub const DEFAULT_GATEWAY: &str = "https://ipfs.io";

/// Content-addressable scheme prefix stripped before gateway resolution.
pub const IPFS_SCHEME: &str = "ipfs://";

/// Resolves a content-addressable URI to asset metadata.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn resolve(&self, uri: &str) -> Result<AuctionMetadata, MetadataError>;
}

/// Gateway-backed resolver: strips a recognized `ipfs://` prefix when
/// present (bare hashes are accepted too) and fetches
/// `<gateway>/ipfs/<hash>` with a single GET.
#[derive(Debug, Clone)]
pub struct IpfsResolver {
    http: reqwest::Client,
    gateway: String,
}

impl IpfsResolver {
    pub fn new(gateway: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            gateway: gateway.unwrap_or_else(|| DEFAULT_GATEWAY.to_string()),
        }
    }

    /// Gateway URL for a metadata URI, with or without the scheme prefix.
    pub fn gateway_url(&self, uri: &str) -> String {
        let hash = uri.strip_prefix(IPFS_SCHEME).unwrap_or(uri);
        format!("{}/ipfs/{}", self.gateway.trim_end_matches('/'), hash)
    }
}

#[async_trait]
impl MetadataSource for IpfsResolver {
    async fn resolve(&self, uri: &str) -> Result<AuctionMetadata, MetadataError> {
        let url = self.gateway_url(uri);
        let body = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let document: MetadataDocument = serde_json::from_str(&body)?;
        Ok(document.into())
    }
}
