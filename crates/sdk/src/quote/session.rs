use alloy::primitives::Address;
use chrono::{DateTime, Utc};

use crate::types::{Quote, Route, Token};

/// User-controlled swap inputs. Any change to them invalidates the current
/// quote.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuoteInputs {
    pub from_token: Option<Token>,
    pub to_token: Option<Token>,
    /// Amount as typed, either decimal separator.
    pub amount: String,
    /// Connected wallet, if any.
    pub sender: Option<Address>,
}

impl QuoteInputs {
    pub fn new(from_token: Token, to_token: Token, amount: impl Into<String>) -> Self {
        Self {
            from_token: Some(from_token),
            to_token: Some(to_token),
            amount: amount.into(),
            sender: None,
        }
    }

    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }
}

/// Live quote state, as displayed.
///
/// Quote-derived fields are all set together from one [`Quote`] or all
/// cleared together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteSession {
    pub quote: Option<Quote>,

    /// Formatted output amount.
    pub output: String,

    /// Output per unit of input, 6 decimals.
    pub price: String,

    /// Formatted worst-case output.
    pub min_received: String,

    /// Price impact of the first route hop, in percent, 2 decimals.
    pub market_impact: String,

    /// Cheapest route group of the quote.
    pub best_route: Vec<Route>,

    /// Wall-clock time the current quote was received.
    pub fetched_at: Option<DateTime<Utc>>,

    /// Seconds left before the quote is refreshed.
    pub expiry_remaining: u64,

    pub is_fetching: bool,

    pub is_manual_refresh_in_flight: bool,

    /// Message of the last failed fetch, cleared by the next attempt.
    pub last_error: Option<String>,

    /// Formatted wallet balance of the from-token.
    pub from_balance: Option<String>,

    pub balance_loading: bool,
}

impl QuoteSession {
    pub(crate) fn new(validity_seconds: u64) -> Self {
        Self {
            quote: None,
            output: String::new(),
            price: String::new(),
            min_received: String::new(),
            market_impact: String::new(),
            best_route: Vec::new(),
            fetched_at: None,
            expiry_remaining: validity_seconds,
            is_fetching: false,
            is_manual_refresh_in_flight: false,
            last_error: None,
            from_balance: None,
            balance_loading: false,
        }
    }

    /// Manual refresh is offered only while nothing is being fetched.
    pub fn can_refresh(&self) -> bool { !self.is_fetching && !self.is_manual_refresh_in_flight }

    /// Whether the quote carries a transaction that can be sent.
    pub fn is_executable(&self) -> bool {
        self.quote.as_ref().is_some_and(|q| q.transaction.is_some())
    }

    pub(crate) fn set_quote(&mut self, quote: Quote, best_route: Vec<Route>) {
        self.output = quote.output_formatted.clone();
        self.price = quote.unit_price();
        self.min_received = quote.min_output_formatted.clone();
        self.market_impact = quote.market_impact();
        self.best_route = best_route;
        self.quote = Some(quote);
    }

    pub(crate) fn clear_quote(&mut self) {
        self.quote = None;
        self.output.clear();
        self.price.clear();
        self.min_received.clear();
        self.market_impact.clear();
        self.best_route.clear();
        self.fetched_at = None;
    }
}

#[cfg(feature = "display")]
impl std::fmt::Display for QuoteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use colored::Colorize;
        use itertools::Itertools;
        use tabled::{Table, Tabled, settings::Style};

        #[derive(Tabled)]
        struct HopRow {
            #[tabled(rename = "Hop")]
            hop: String,
            #[tabled(rename = "Venues")]
            venues: String,
            #[tabled(rename = "Fee")]
            fee: String,
            #[tabled(rename = "Impact %")]
            impact: String,
        }

        match &self.quote {
            Some(quote) => {
                writeln!(
                    f,
                    "{} {} -> {} | Price: {} | Min received: {} | Impact: {} %",
                    "Quote".blue(),
                    quote.input_formatted,
                    self.output.green(),
                    self.price,
                    self.min_received,
                    if self.market_impact.is_empty() { "-" } else { &self.market_impact },
                )?;
            },
            None if self.is_fetching => writeln!(f, "{}", "Fetching quote...".yellow())?,
            None => writeln!(f, "{}", "No quote".dimmed())?,
        }

        if let Some(err) = &self.last_error {
            writeln!(f, "{} {}", "Error:".bright_red(), err.red())?;
        }

        if self.fetched_at.is_some() {
            let status = if self.is_manual_refresh_in_flight {
                " (refreshing)".yellow().to_string()
            } else if self.is_fetching {
                " (updating)".yellow().to_string()
            } else {
                String::new()
            };
            writeln!(f, "Expires in {}s{}", self.expiry_remaining, status)?;
        }

        if let Some(balance) = &self.from_balance {
            writeln!(f, "Balance: {}", balance)?;
        }

        if f.alternate() && !self.best_route.is_empty() {
            let rows = self.best_route.iter().map(|route| HopRow {
                hop: format!("{} -> {}", route.from_symbol, route.to_symbol),
                venues: route
                    .splits
                    .iter()
                    .map(|s| format!("{} {}%", s.protocol, s.percentage))
                    .join(", "),
                fee: route.total_fee().to_string(),
                impact: route.weighted_price_impact.clone(),
            });
            let mut table = Table::new(rows);
            table.with(Style::sharp());
            writeln!(f, "{}", table)?;
        }

        Ok(())
    }
}
