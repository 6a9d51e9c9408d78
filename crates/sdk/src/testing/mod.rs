//! Scripted data sources and fixtures for driving the quote lifecycle
//! without network access.

pub mod rpc;
mod source;

use alloy::primitives::{Address, address};
pub use source::{MockBalanceSource, MockQuoteSource};

use crate::types::{Quote, Route, Split, Token, TokenBalance};

pub const USDC_ADDRESS: Address = address!("0x00000000000000000000000000000000000000c1");
pub const WETH_ADDRESS: Address = address!("0x00000000000000000000000000000000000000e1");

/// Native token.
pub fn mon() -> Token {
    Token { name: "Monad".to_string(), ..Token::new(Address::ZERO, "MON", 18) }
}

pub fn usdc() -> Token {
    Token { name: "USD Coin".to_string(), ..Token::new(USDC_ADDRESS, "USDC", 6) }
}

pub fn weth() -> Token {
    Token { name: "Wrapped Ether".to_string(), ..Token::new(WETH_ADDRESS, "WETH", 18) }
}

/// Quote with the given formatted amounts and no routes.
pub fn quote(input: &str, output: &str, min_output: &str) -> Quote {
    Quote {
        input_formatted: input.to_string(),
        output_formatted: output.to_string(),
        min_output_formatted: min_output.to_string(),
        ..Default::default()
    }
}

/// Single hop with one split per fee.
pub fn hop(from: &Token, to: &Token, fees: &[&str], weighted_price_impact: &str) -> Route {
    Route {
        from: from.address.to_string(),
        from_symbol: from.symbol.clone(),
        to: to.address.to_string(),
        to_symbol: to.symbol.clone(),
        splits: fees
            .iter()
            .map(|fee| Split {
                protocol: "test".to_string(),
                fee: fee.to_string(),
                percentage: (100 / fees.len().max(1)).to_string(),
                ..Default::default()
            })
            .collect(),
        weighted_price_impact: weighted_price_impact.to_string(),
        ..Default::default()
    }
}

pub fn balance(token: &Token, amount: &str) -> TokenBalance {
    TokenBalance {
        address: token.address,
        symbol: token.symbol.clone(),
        name: token.name.clone(),
        decimals: token.decimals,
        balance: amount.to_string(),
        ..Default::default()
    }
}
