//! Market data API clients and the seams the quote controller consumes them
//! through.

mod monorail;

use alloy::primitives::Address;
use async_trait::async_trait;
pub use monorail::{MonorailClient, TokenQuery};
use serde::Deserialize;

use crate::{
    error::ToolsError,
    types::{Quote, QuoteRequest, TokenBalance},
};

/// Source of swap quotes.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, ToolsError>;
}

/// Source of wallet token balances.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn wallet_balances(&self, wallet: Address) -> Result<Vec<TokenBalance>, ToolsError>;
}

/// Error body returned by the market data APIs.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "error")]
    message: String,
}

/// Builds [`ToolsError::Api`] from a non-2xx response body, falling back to
/// the status reason when the body is not the expected JSON.
pub(crate) fn api_error(status: reqwest::StatusCode, body: &str) -> ToolsError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|body| body.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            format!("request failed: {}", status.canonical_reason().unwrap_or(status.as_str()))
        });
    ToolsError::Api { status: status.as_u16(), message }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn test_api_error_message() {
        let err = api_error(StatusCode::BAD_REQUEST, r#"{"message":"amount too small"}"#);
        assert!(
            matches!(err, ToolsError::Api { status: 400, ref message } if message == "amount too small")
        );

        let err = api_error(StatusCode::BAD_REQUEST, r#"{"error":"Wallet address is required"}"#);
        assert_eq!(err.to_string(), "Wallet address is required");

        let err = api_error(StatusCode::BAD_GATEWAY, "<html>upstream down</html>");
        assert_eq!(err.to_string(), "request failed: Bad Gateway");
    }
}
