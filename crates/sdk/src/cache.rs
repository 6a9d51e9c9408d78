//! In-memory token metadata cache.

use std::{future::Future, time::Duration};

use alloy::{primitives::Address, providers::Provider};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use crate::{abi::IERC20, error::ToolsError};

/// Metadata rarely changes, keep it for a week.
pub const DEFAULT_META_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// ERC-20 metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

#[derive(Debug)]
struct CachedMeta {
    meta: TokenMeta,
    cached_at: Instant,
}

/// Token metadata keyed by contract address, each entry valid for a fixed
/// TTL.
///
/// Constructed explicitly and shared by reference; failed lookups are never
/// cached.
#[derive(Debug)]
pub struct TokenMetaCache {
    entries: DashMap<Address, CachedMeta>,
    ttl: Duration,
}

impl TokenMetaCache {
    pub fn new() -> Self { Self::with_ttl(DEFAULT_META_TTL) }

    pub fn with_ttl(ttl: Duration) -> Self { Self { entries: DashMap::new(), ttl } }

    /// Fresh cached entry, if any. Expired entries are evicted.
    pub fn get(&self, address: Address) -> Option<TokenMeta> {
        let entry = self.entries.get(&address)?;
        if entry.cached_at.elapsed() >= self.ttl {
            drop(entry);
            self.entries.remove(&address);
            return None;
        }
        Some(entry.meta.clone())
    }

    pub fn insert(&self, address: Address, meta: TokenMeta) {
        self.entries.insert(address, CachedMeta { meta, cached_at: Instant::now() });
    }

    /// Returns the cached entry or fetches, stores and returns a new one.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        address: Address,
        fetch: F,
    ) -> Result<TokenMeta, ToolsError>
    where
        F: FnOnce(Address) -> Fut,
        Fut: Future<Output = Result<TokenMeta, ToolsError>>,
    {
        if let Some(meta) = self.get(address) {
            debug!(%address, "token meta cache hit");
            return Ok(meta);
        }
        let meta = fetch(address).await?;
        self.insert(address, meta.clone());
        Ok(meta)
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn clear(&self) { self.entries.clear() }
}

impl Default for TokenMetaCache {
    fn default() -> Self { Self::new() }
}

/// Reads `symbol`, `name` and `decimals` of an ERC-20 contract.
pub async fn fetch_erc20_meta<P: Provider>(
    provider: &P,
    address: Address,
) -> Result<TokenMeta, ToolsError> {
    let token = IERC20::new(address, provider);
    let symbol = token.symbol().call().await?;
    let name = token.name().call().await?;
    let decimals = token.decimals().call().await?;
    Ok(TokenMeta { symbol, name, decimals })
}

/// Parses a user-entered contract address: 40 hex digits, optional `0x`
/// prefix, any case, surrounding whitespace ignored.
pub fn validate_address(input: &str) -> Option<Address> {
    let trimmed = input.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    hex.parse().ok()
}
