use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::{
    api::{BalanceSource, QuoteSource},
    error::ToolsError,
    types::{Quote, QuoteRequest, TokenBalance},
};

/// Status reported by scripted failures.
const SCRIPTED_STATUS: u16 = 400;

#[derive(Debug)]
struct Scripted<T> {
    delay: Duration,
    result: Result<T, String>,
}

#[derive(Debug)]
struct Script<T, R> {
    responses: VecDeque<Scripted<T>>,
    fallback: Option<T>,
    requests: Vec<R>,
}

impl<T: Clone, R> Script<T, R> {
    fn new(fallback: Option<T>) -> Self {
        Self { responses: VecDeque::new(), fallback, requests: Vec::new() }
    }

    fn next(&mut self, request: R) -> Scripted<T> {
        self.requests.push(request);
        self.responses.pop_front().unwrap_or_else(|| Scripted {
            delay: Duration::ZERO,
            result: self.fallback.clone().ok_or_else(|| "no scripted response".to_string()),
        })
    }
}

async fn play<T>(scripted: Scripted<T>) -> Result<T, ToolsError> {
    if !scripted.delay.is_zero() {
        tokio::time::sleep(scripted.delay).await;
    }
    scripted.result.map_err(|message| ToolsError::Api { status: SCRIPTED_STATUS, message })
}

/// Quote source answering from a script.
///
/// Responses are served in order, each after its delay; once the script runs
/// out the fallback quote is returned, or an error if none is set. Clones
/// share the script, so a test can keep one while the controller owns
/// another.
#[derive(Clone, Debug)]
pub struct MockQuoteSource {
    script: Arc<Mutex<Script<Quote, QuoteRequest>>>,
}

impl MockQuoteSource {
    pub fn new() -> Self { Self { script: Arc::new(Mutex::new(Script::new(None))) } }

    /// Source answering every request with `quote`.
    pub fn always(quote: Quote) -> Self {
        Self { script: Arc::new(Mutex::new(Script::new(Some(quote)))) }
    }

    pub fn respond(&self, quote: Quote) -> &Self { self.respond_after(Duration::ZERO, quote) }

    pub fn respond_after(&self, delay: Duration, quote: Quote) -> &Self {
        self.push(Scripted { delay, result: Ok(quote) })
    }

    pub fn fail(&self, message: &str) -> &Self { self.fail_after(Duration::ZERO, message) }

    pub fn fail_after(&self, delay: Duration, message: &str) -> &Self {
        self.push(Scripted { delay, result: Err(message.to_string()) })
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<QuoteRequest> { self.script.lock().unwrap().requests.clone() }

    pub fn call_count(&self) -> usize { self.script.lock().unwrap().requests.len() }

    fn push(&self, scripted: Scripted<Quote>) -> &Self {
        self.script.lock().unwrap().responses.push_back(scripted);
        self
    }
}

impl Default for MockQuoteSource {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl QuoteSource for MockQuoteSource {
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, ToolsError> {
        let scripted = self.script.lock().unwrap().next(request.clone());
        play(scripted).await
    }
}

/// Wallet balance source answering from a script, see [`MockQuoteSource`].
///
/// Falls back to an empty wallet.
#[derive(Clone, Debug)]
pub struct MockBalanceSource {
    script: Arc<Mutex<Script<Vec<TokenBalance>, Address>>>,
}

impl MockBalanceSource {
    pub fn new() -> Self { Self::always(Vec::new()) }

    pub fn always(balances: Vec<TokenBalance>) -> Self {
        Self { script: Arc::new(Mutex::new(Script::new(Some(balances)))) }
    }

    pub fn respond(&self, balances: Vec<TokenBalance>) -> &Self {
        self.respond_after(Duration::ZERO, balances)
    }

    pub fn respond_after(&self, delay: Duration, balances: Vec<TokenBalance>) -> &Self {
        self.script.lock().unwrap().responses.push_back(Scripted { delay, result: Ok(balances) });
        self
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.script
            .lock()
            .unwrap()
            .responses
            .push_back(Scripted { delay: Duration::ZERO, result: Err(message.to_string()) });
        self
    }

    /// Wallets queried so far, in order.
    pub fn requests(&self) -> Vec<Address> { self.script.lock().unwrap().requests.clone() }
}

impl Default for MockBalanceSource {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl BalanceSource for MockBalanceSource {
    async fn wallet_balances(&self, wallet: Address) -> Result<Vec<TokenBalance>, ToolsError> {
        let scripted = self.script.lock().unwrap().next(wallet);
        play(scripted).await
    }
}
