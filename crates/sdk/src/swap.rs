//! Execution of a quoted swap through a connected wallet.

use std::time::Duration;

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, TxHash, U256},
    providers::Provider,
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    abi::IERC20,
    error::ToolsError,
    num,
    types::{Quote, Token},
};

/// Default time to wait for a transaction to be included.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Signing and sending side of a connected wallet.
#[async_trait]
pub trait SwapWallet: Send + Sync {
    /// Allows `spender` to transfer `amount` base units of `token`.
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, ToolsError>;

    async fn send_transaction(
        &self,
        to: Address,
        data: Bytes,
        value: U256,
    ) -> Result<TxHash, ToolsError>;

    /// Waits until the transaction is included, failing if it reverted.
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<(), ToolsError>;
}

/// Hashes of the transactions sent by [`execute_swap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapOutcome {
    /// Allowance transaction, absent for the native token.
    pub approval: Option<TxHash>,
    pub swap: TxHash,
}

/// Sends the swap transaction of a quote.
///
/// A non-native from-token is first approved for `amount` to the quote's
/// router, and the approval awaited. The quote itself is not modified, so a
/// failed swap can be retried with it or a refreshed one.
pub async fn execute_swap<W: SwapWallet + ?Sized>(
    wallet: &W,
    from_token: &Token,
    amount: &str,
    quote: &Quote,
) -> Result<SwapOutcome, ToolsError> {
    let tx = quote
        .transaction
        .as_ref()
        .ok_or_else(|| ToolsError::InvalidRequest("quote carries no transaction".to_string()))?;
    let value = tx.value()?;

    let approval = if from_token.is_native() {
        None
    } else {
        let allowance = num::to_base_units(amount, from_token.decimals)?;
        debug!(token = %from_token.address, spender = %tx.to, %allowance, "approving");
        let hash = wallet.approve(from_token.address, tx.to, allowance).await?;
        wallet.wait_for_confirmation(hash).await?;
        Some(hash)
    };

    let swap = wallet.send_transaction(tx.to, tx.data.clone(), value).await?;
    info!(%swap, "swap sent");
    Ok(SwapOutcome { approval, swap })
}

/// [`SwapWallet`] over an alloy provider able to sign for `from`.
#[derive(Clone, Debug)]
pub struct ProviderWallet<P> {
    provider: P,
    from: Address,
    confirmation_timeout: Duration,
}

impl<P: Provider> ProviderWallet<P> {
    pub fn new(provider: P, from: Address) -> Self {
        Self { provider, from, confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT }
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn address(&self) -> Address { self.from }
}

#[async_trait]
impl<P: Provider + Send + Sync> SwapWallet for ProviderWallet<P> {
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, ToolsError> {
        let pending = IERC20::new(token, &self.provider)
            .approve(spender, amount)
            .from(self.from)
            .send()
            .await
            .map_err(|err| ToolsError::TransactionFailed(format!("approval: {}", err)))?;
        Ok(*pending.tx_hash())
    }

    async fn send_transaction(
        &self,
        to: Address,
        data: Bytes,
        value: U256,
    ) -> Result<TxHash, ToolsError> {
        let request = TransactionRequest::default()
            .with_from(self.from)
            .with_to(to)
            .with_input(data)
            .with_value(value);
        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(|err| ToolsError::TransactionFailed(format!("swap: {}", err)))?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<(), ToolsError> {
        let poll_interval = self.provider.client().poll_interval();
        let deadline = tokio::time::Instant::now() + self.confirmation_timeout;
        loop {
            if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                if !receipt.status() {
                    return Err(ToolsError::TransactionFailed(format!("{} reverted", tx_hash)));
                }
                debug!(%tx_hash, block = ?receipt.block_number, "confirmed");
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ToolsError::TransactionFailed(format!(
                    "{} not confirmed within {:?}",
                    tx_hash, self.confirmation_timeout
                )));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
