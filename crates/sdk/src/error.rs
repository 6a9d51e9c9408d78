use alloy::{contract, primitives::utils::UnitsError, transports::TransportError};
use thiserror::Error;

/// Message shown when a failed quote carries no usable description.
pub const QUOTE_FALLBACK_MESSAGE: &str = "Failed to fetch quote";

#[derive(Debug, Error)]
pub enum ToolsError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Non-2xx response of a market data API, with the message from its
    /// `{ "message": ... }` body when present.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("decoding error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("rpc error: {0}")]
    Rpc(#[from] TransportError),

    #[error("contract error: {0}")]
    Contract(#[from] contract::Error),

    #[error("units error: {0}")]
    Units(#[from] UnitsError),

    /// Approval or swap transaction rejected by the wallet or reverted.
    #[error("transaction failed: {0}")]
    TransactionFailed(String),
}

impl ToolsError {
    /// Text suitable for inline display next to a quote.
    pub fn display_message(&self) -> String {
        let message = match self {
            ToolsError::Api { message, .. } => message.trim().to_string(),
            other => other.to_string(),
        };
        if message.is_empty() { QUOTE_FALLBACK_MESSAGE.to_string() } else { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_message() {
        let err = ToolsError::Api { status: 400, message: "no route found".to_string() };
        assert_eq!(err.display_message(), "no route found");

        let err = ToolsError::Api { status: 502, message: " ".to_string() };
        assert_eq!(err.display_message(), QUOTE_FALLBACK_MESSAGE);

        let err = ToolsError::InvalidRequest("timeout".to_string());
        assert_eq!(err.display_message(), "invalid request: timeout");
    }
}
