use std::str::FromStr;

use alloy::primitives::{Address, Bytes, U256};
use fastnum::UD128;
use serde::{Deserialize, Serialize};

use crate::{error::ToolsError, num};

/// Parameters of a single quote API call.
///
/// Built fresh for every fetch from the current swap inputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuoteRequest {
    pub from: Address,

    pub to: Address,

    /// Normalized decimal amount of `from` tokens.
    pub amount: String,

    /// Wallet the swap transaction is built for. Without it the API quotes
    /// but returns no transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<Address>,

    /// Transaction deadline, in seconds.
    pub deadline: u64,

    /// Integration tag reported to the API.
    pub source: String,

    /// Maximum slippage, in basis points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_slippage: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hops: Option<u8>,

    /// Comma-separated protocol names to route around.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_protocols: Option<String>,
}

/// Priced route proposal returned by the quote API.
///
/// Treated as an opaque snapshot: replaced wholesale, never patched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub block: u64,

    #[serde(default)]
    pub from: String,

    #[serde(default)]
    pub to: String,

    #[serde(default)]
    pub hops: u32,

    #[serde(default)]
    pub compound_impact: String,

    #[serde(default)]
    pub input: String,

    #[serde(default)]
    pub input_formatted: String,

    #[serde(default)]
    pub output: String,

    #[serde(default)]
    pub output_formatted: String,

    #[serde(default)]
    pub min_output: String,

    #[serde(default)]
    pub min_output_formatted: String,

    /// Candidate route groups, each a complete path from `from` to `to`.
    #[serde(default)]
    pub routes: Vec<RouteGroup>,

    /// Ready-to-send swap transaction, present when a sender was given.
    #[serde(default)]
    pub transaction: Option<TransactionPayload>,
}

/// One complete, possibly multi-hop, path between the quoted tokens.
pub type RouteGroup = Vec<Route>;

/// Single hop of a route group, possibly split across venues.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub from: String,

    #[serde(default)]
    pub from_symbol: String,

    #[serde(default)]
    pub to: String,

    #[serde(default)]
    pub to_symbol: String,

    #[serde(default)]
    pub input_formatted: String,

    #[serde(default)]
    pub output_formatted: String,

    #[serde(default)]
    pub splits: Vec<Split>,

    #[serde(default)]
    pub weighted_price_impact: String,
}

/// Portion of a hop routed through one liquidity venue.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    #[serde(default)]
    pub protocol: String,

    /// Venue fee, as a decimal fraction.
    #[serde(default)]
    pub fee: String,

    #[serde(default)]
    pub percentage: String,

    #[serde(default)]
    pub price_impact: String,

    #[serde(default)]
    pub input_formatted: String,

    #[serde(default)]
    pub output_formatted: String,

    #[serde(default)]
    pub min_output_formatted: String,
}

/// Swap transaction to be signed and sent by the wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPayload {
    pub to: Address,

    #[serde(default)]
    pub data: Bytes,

    /// Native value in wei, decimal or `0x` hex.
    #[serde(default)]
    pub value: String,
}

impl Quote {
    /// Output per unit of input, see [`num::unit_price`].
    pub fn unit_price(&self) -> String {
        num::unit_price(&self.input_formatted, &self.output_formatted)
    }

    /// Weighted price impact of the first hop of the first route group,
    /// to two decimals. Empty when the quote carries no routes.
    pub fn market_impact(&self) -> String {
        self.routes
            .first()
            .and_then(|group| group.first())
            .map(|route| num::fixed(&route.weighted_price_impact, num::IMPACT_DECIMALS))
            .unwrap_or_default()
    }
}

impl Route {
    /// Sum of fees of all venue splits of this hop.
    pub fn total_fee(&self) -> UD128 { self.splits.iter().map(Split::fee).sum() }
}

impl Split {
    /// Venue fee, zero when missing or not a decimal.
    pub fn fee(&self) -> UD128 { self.fee.trim().parse::<UD128>().unwrap_or(UD128::ZERO) }
}

impl TransactionPayload {
    pub fn value(&self) -> Result<U256, ToolsError> {
        let value = self.value.trim();
        if value.is_empty() {
            return Ok(U256::ZERO);
        }
        U256::from_str(value).map_err(|err| {
            ToolsError::InvalidArgument(format!("invalid transaction value {:?}: {}", value, err))
        })
    }
}
