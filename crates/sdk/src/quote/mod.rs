//! Swap quote lifecycle.
//!
//! # Architecture
//!
//! - [`QuoteLifecycle`] - Pure, synchronous state machine: input change
//!   detection, validation, sequence-guarded completion and expiry countdown
//! - [`QuoteController`] - Async driver owning a lifecycle, the fetch tasks
//!   and the [`ExpiryTimer`]
//! - [`select_best_route`] - Cheapest route group of a quote
//!
//! The lifecycle never performs I/O. Every operation that needs a quote
//! returns a [`FetchTicket`] the caller resolves and hands back through
//! [`QuoteLifecycle::complete`]. A ticket whose sequence number is no longer
//! the latest issued is discarded on completion, so a slow response can
//! never overwrite a newer one.

mod controller;
mod lifecycle;
mod route;
mod session;
mod timer;

use std::time::Duration;

pub use controller::QuoteController;
pub use lifecycle::{BalanceTicket, FetchKind, FetchTicket, InputUpdate, QuoteLifecycle, Tick};
pub use route::{route_group_fee, select_best_route};
pub use session::{QuoteInputs, QuoteSession};
pub use timer::ExpiryTimer;

/// Seconds a fetched quote is considered valid.
pub const QUOTE_VALIDITY_SECONDS: u64 = 60;

/// Source tag sent with every quote request.
pub const DEFAULT_SOURCE: &str = "montools";

/// Quote lifecycle configuration.
#[derive(Clone, Debug)]
pub struct QuoteConfig {
    /// Validity window of a fetched quote, in seconds.
    pub validity_seconds: u64,

    /// Countdown cadence.
    pub tick_interval: Duration,

    /// Deadline of the swap transaction built by the API, in seconds.
    pub deadline_seconds: u64,

    pub source: String,

    /// Maximum slippage, in basis points.
    pub max_slippage: Option<u32>,

    pub max_hops: Option<u8>,

    pub excluded_protocols: Option<String>,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            validity_seconds: QUOTE_VALIDITY_SECONDS,
            tick_interval: Duration::from_secs(1),
            deadline_seconds: QUOTE_VALIDITY_SECONDS,
            source: DEFAULT_SOURCE.to_string(),
            max_slippage: None,
            max_hops: None,
            excluded_protocols: None,
        }
    }
}
