use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use super::{BalanceSource, QuoteSource, api_error};
use crate::{
    Chain,
    error::ToolsError,
    types::{Quote, QuoteRequest, Token, TokenBalance},
};

/// Client of the Monorail pathfinder (quotes) and data (tokens, wallets)
/// APIs.
///
/// Holds a caller-provided [`reqwest::Client`], so one connection pool can be
/// shared across clients and its lifetime is owned by the caller.
#[derive(Clone, Debug)]
pub struct MonorailClient {
    http: reqwest::Client,
    quote_api: String,
    data_api: String,
    app_id: Option<String>,
}

/// Paging of token listings.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TokenQuery {
    /// Free text search by symbol, name or address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub find: Option<String>,

    /// Wallet to include balances for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl MonorailClient {
    pub fn new(http: reqwest::Client, chain: &Chain) -> Self {
        Self {
            http,
            quote_api: chain.quote_api().to_string(),
            data_api: chain.data_api().to_string(),
            app_id: None,
        }
    }

    /// Application ID reported as `source` on data API calls.
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Fetches a swap quote.
    pub async fn quote(&self, request: &QuoteRequest) -> Result<Quote, ToolsError> {
        self.get(format!("{}/quote", self.quote_api), request).await
    }

    /// Fetches a token by contract address.
    pub async fn token(&self, address: Address) -> Result<Token, ToolsError> {
        self.get_data(format!("token/{}", address), &TokenQuery::default()).await
    }

    /// Lists available tokens.
    pub async fn tokens(&self, query: &TokenQuery) -> Result<Vec<Token>, ToolsError> {
        self.get_data("tokens".to_string(), query).await
    }

    /// Lists tokens of a category, see [`crate::types::TOKEN_CATEGORIES`].
    pub async fn tokens_by_category(
        &self,
        category: &str,
        query: &TokenQuery,
    ) -> Result<Vec<Token>, ToolsError> {
        if category.is_empty() || category.contains('/') {
            return Err(ToolsError::InvalidArgument(format!("invalid category: {:?}", category)));
        }
        self.get_data(format!("tokens/category/{}", category), query).await
    }

    /// Number of available tokens.
    pub async fn tokens_count(&self) -> Result<u64, ToolsError> {
        self.get_data("tokens/count".to_string(), &TokenQuery::default()).await
    }

    /// Balances of all tokens held by a wallet.
    pub async fn wallet_balances(&self, wallet: Address) -> Result<Vec<TokenBalance>, ToolsError> {
        self.get_data(format!("wallet/{}/balances", wallet), &TokenQuery::default()).await
    }

    async fn get_data<Q, T>(&self, path: String, query: &Q) -> Result<T, ToolsError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.data_api, path);
        let source = self.app_id.as_deref().map(|app_id| [("source", app_id)]);
        self.get_with(url, query, source.as_ref().map_or(&[][..], |s| &s[..])).await
    }

    async fn get<Q, T>(&self, url: String, query: &Q) -> Result<T, ToolsError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.get_with(url, query, &[]).await
    }

    async fn get_with<Q, T>(
        &self,
        url: String,
        query: &Q,
        extra: &[(&str, &str)],
    ) -> Result<T, ToolsError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(%url, "GET");
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .query(extra)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            debug!(%url, %status, "request rejected");
            return Err(api_error(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl QuoteSource for MonorailClient {
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, ToolsError> {
        MonorailClient::quote(self, request).await
    }
}

#[async_trait]
impl BalanceSource for MonorailClient {
    async fn wallet_balances(&self, wallet: Address) -> Result<Vec<TokenBalance>, ToolsError> {
        MonorailClient::wallet_balances(self, wallet).await
    }
}
