mod quote;

use std::{fmt::Display, str::FromStr};

use alloy::primitives::Address;
pub use quote::*;
use serde::{Deserialize, Deserializer, Serialize};

/// Token categories the data API groups listings by.
pub const TOKEN_CATEGORIES: [&str; 5] = ["verified", "stable", "lst", "bridged", "meme"];

/// Token descriptor as listed by the data API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Contract address, zero for the native token.
    #[serde(deserialize_with = "de_token_address")]
    pub address: Address,

    pub symbol: String,

    pub name: String,

    #[serde(deserialize_with = "de_decimals")]
    pub decimals: u8,

    #[serde(default)]
    pub categories: Vec<String>,

    /// Balance of the queried wallet, when the listing was requested for one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
}

impl Token {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        let symbol = symbol.into();
        Self {
            address,
            name: symbol.clone(),
            symbol,
            decimals,
            categories: Vec::new(),
            balance: None,
        }
    }

    /// Native chain token, which needs no allowance to be swapped.
    pub fn is_native(&self) -> bool { self.address.is_zero() }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "{} ({})", self.symbol, self.address)
        } else {
            write!(f, "{}", self.symbol)
        }
    }
}

/// Balance of one token held by a wallet, as reported by the data API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    #[serde(deserialize_with = "de_token_address")]
    pub address: Address,

    #[serde(default)]
    pub id: Option<String>,

    pub symbol: String,

    pub name: String,

    #[serde(deserialize_with = "de_decimals")]
    pub decimals: u8,

    /// Formatted balance (in whole tokens).
    pub balance: String,

    #[serde(default)]
    pub categories: Vec<String>,

    /// Value of one token in native units, when priced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mon_per_token: Option<String>,
}

/// Decimals arrive either as a number or as a numeric string.
fn de_decimals<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimals {
        Number(u8),
        Text(String),
    }

    match Decimals::deserialize(deserializer)? {
        Decimals::Number(n) => Ok(n),
        Decimals::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Native token is sometimes listed under the `"native"` pseudo-address.
fn de_token_address<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
    let s = String::deserialize(deserializer)?;
    if s.eq_ignore_ascii_case("native") {
        return Ok(Address::ZERO);
    }
    Address::from_str(s.trim()).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    #[test]
    fn test_token_listing_decoding() {
        let tokens: Vec<Token> = serde_json::from_str(
            r#"[
                {"address":"0x0000000000000000000000000000000000000000","symbol":"MON","name":"Monad","decimals":18,"categories":["verified"]},
                {"address":"0xf817257fed379853cDe0fa4F97AB987181B1E5Ea","symbol":"USDC","name":"USD Coin","decimals":"6","categories":["verified","stable"],"balance":"12.5"}
            ]"#,
        )
        .unwrap();

        assert_eq!(tokens.len(), 2);
        assert!(tokens[0].is_native());
        assert_eq!(tokens[1].address, address!("0xf817257fed379853cDe0fa4F97AB987181B1E5Ea"));
        assert_eq!(tokens[1].decimals, 6);
        assert_eq!(tokens[1].balance.as_deref(), Some("12.5"));
        assert_eq!(format!("{}", tokens[1]), "USDC");
    }

    #[test]
    fn test_wallet_balance_decoding() {
        let balances: Vec<TokenBalance> = serde_json::from_str(
            r#"[{"address":"native","id":"1","symbol":"MON","name":"Monad","decimals":18,"balance":"3.25","categories":[],"mon_per_token":"1"}]"#,
        )
        .unwrap();

        assert_eq!(balances[0].address, Address::ZERO);
        assert_eq!(balances[0].balance, "3.25");
        assert_eq!(balances[0].mon_per_token.as_deref(), Some("1"));
    }
}
