//! MonTools SDK.
//!
//! # Overview
//!
//! Swap quote lifecycle and the thin market data plumbing around it.
//!
//! Use [`quote::QuoteController`] to keep a swap quote fresh: it re-fetches
//! on every input change, counts the quote validity window down and
//! refreshes once on expiry, discarding responses superseded by newer
//! requests. [`quote::QuoteLifecycle`] is the same state machine without the
//! async driver, for callers that bring their own event loop.
//!
//! Use [`api::MonorailClient`] for quotes, token lists and wallet balances,
//! [`swap::execute_swap`] to approve and send a quoted swap,
//! [`inspect::detect`] to probe a contract for its token standard and
//! [`cache::TokenMetaCache`] to memoize ERC-20 metadata.
//!
//! # Features
//!
//! | Feature | Default | Description |
//! | --- | --- | --- |
//! | `display` | yes | Enables [`std::fmt::Display`] implementation for session and token types. |
//! | `testing` | yes | Enables [`testing`] module. |
//!
//! # Testing
//!
//! [`testing`] module provides scripted quote and balance sources so the
//! controller can be driven without network access.

pub mod abi;
pub mod api;
pub mod cache;
pub mod error;
pub mod inspect;
pub mod num;
pub mod quote;
pub mod swap;
#[cfg(feature = "testing")]
pub mod testing;
pub mod types;

#[derive(Clone, Debug)]
/// Chain the tools are operating on, with the endpoints serving it.
pub struct Chain {
    chain_id: u64,
    rpc_url: String,
    quote_api: String,
    data_api: String,
    explorer: String,
    native_symbol: String,
}

impl Chain {
    pub fn testnet() -> Self {
        Self {
            chain_id: 10143,
            rpc_url: "https://testnet-rpc.monad.xyz".to_string(),
            quote_api: "https://testnet-pathfinder-v2.monorail.xyz/v3".to_string(),
            data_api: "https://testnet-api.monorail.xyz/v1".to_string(),
            explorer: "https://testnet.monadexplorer.com".to_string(),
            native_symbol: "MON".to_string(),
        }
    }

    pub fn custom(
        chain_id: u64,
        rpc_url: impl Into<String>,
        quote_api: impl Into<String>,
        data_api: impl Into<String>,
        explorer: impl Into<String>,
    ) -> Self {
        Self {
            chain_id,
            rpc_url: rpc_url.into(),
            quote_api: quote_api.into(),
            data_api: data_api.into(),
            explorer: explorer.into(),
            native_symbol: "MON".to_string(),
        }
    }

    pub fn chain_id(&self) -> u64 { self.chain_id }

    pub fn rpc_url(&self) -> &str { &self.rpc_url }

    /// Base URL of the swap quote API, without trailing slash.
    pub fn quote_api(&self) -> &str { self.quote_api.trim_end_matches('/') }

    /// Base URL of the token/wallet data API, without trailing slash.
    pub fn data_api(&self) -> &str { self.data_api.trim_end_matches('/') }

    pub fn explorer(&self) -> &str { self.explorer.trim_end_matches('/') }

    pub fn native_symbol(&self) -> &str { &self.native_symbol }

    /// Explorer page of a transaction.
    pub fn tx_url(&self, tx_hash: alloy::primitives::TxHash) -> String {
        format!("{}/tx/{}", self.explorer(), tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::TxHash;

    use super::*;

    #[test]
    fn test_custom_chain_trims_trailing_slashes() {
        let chain = Chain::custom(
            1,
            "http://localhost:8545",
            "http://quotes.local/v3/",
            "http://data.local/v1/",
            "http://explorer.local/",
        );
        assert_eq!(chain.quote_api(), "http://quotes.local/v3");
        assert_eq!(chain.data_api(), "http://data.local/v1");
        assert_eq!(
            chain.tx_url(TxHash::ZERO),
            format!("http://explorer.local/tx/{}", TxHash::ZERO)
        );
    }
}
