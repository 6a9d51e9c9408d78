use alloy::primitives::Address;
use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{QuoteConfig, QuoteInputs, QuoteSession, select_best_route};
use crate::{
    error::ToolsError,
    num,
    types::{Quote, QuoteRequest, Token, TokenBalance},
};

/// What started a quote fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchKind {
    /// Swap inputs changed.
    Input,
    /// Validity window ran out.
    Expiry,
    /// User asked for a refresh.
    Manual,
}

/// Quote fetch to perform, resolved with [`QuoteLifecycle::complete`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub kind: FetchKind,
    pub request: QuoteRequest,
}

/// Wallet balance fetch to perform, resolved with
/// [`QuoteLifecycle::complete_balance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceTicket {
    pub seq: u64,
    pub wallet: Address,
    pub token: Address,
}

/// Fetches triggered by an input change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputUpdate {
    pub quote: Option<FetchTicket>,
    pub balance: Option<BalanceTicket>,
}

/// Outcome of a countdown tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tick {
    /// No quote is counting down.
    Idle,
    /// Seconds left in the validity window.
    Remaining(u64),
    /// The window just closed. Carries the refetch to perform, `None` when a
    /// fetch is already in flight and will re-arm the countdown itself.
    Expired(Option<FetchTicket>),
}

/// Swap quote state machine.
///
/// Owns the inputs and the [`QuoteSession`] derived from them, never performs
/// I/O. All times are passed in so the machine can be driven by a real or a
/// paused clock.
#[derive(Debug)]
pub struct QuoteLifecycle {
    config: QuoteConfig,
    inputs: QuoteInputs,
    session: QuoteSession,

    /// Last issued quote sequence number.
    seq: u64,
    /// Latest issued quote fetch that has not completed yet.
    in_flight: Option<(u64, FetchKind)>,
    /// Receipt time of the displayed quote, while its countdown is running.
    anchor: Option<Instant>,

    balance_seq: u64,
    balance_in_flight: Option<u64>,
}

impl QuoteLifecycle {
    pub fn new(config: QuoteConfig) -> Self {
        let session = QuoteSession::new(config.validity_seconds);
        Self {
            config,
            inputs: QuoteInputs::default(),
            session,
            seq: 0,
            in_flight: None,
            anchor: None,
            balance_seq: 0,
            balance_in_flight: None,
        }
    }

    pub fn config(&self) -> &QuoteConfig { &self.config }

    pub fn inputs(&self) -> &QuoteInputs { &self.inputs }

    pub fn session(&self) -> &QuoteSession { &self.session }

    /// Whether the expiry countdown is running.
    pub fn is_counting_down(&self) -> bool { self.anchor.is_some() }

    /// Replaces the swap inputs.
    ///
    /// A change of either token, the amount or the sender requests a new
    /// quote right away. A change of the sender or the from-token also
    /// refreshes the from-token balance. Unchanged inputs trigger nothing.
    pub fn set_inputs(&mut self, inputs: QuoteInputs) -> InputUpdate {
        let quote_changed = token_address(&self.inputs.from_token)
            != token_address(&inputs.from_token)
            || token_address(&self.inputs.to_token) != token_address(&inputs.to_token)
            || self.inputs.amount != inputs.amount
            || self.inputs.sender != inputs.sender;
        let balance_changed = self.inputs.sender != inputs.sender
            || token_address(&self.inputs.from_token) != token_address(&inputs.from_token);

        self.inputs = inputs;

        InputUpdate {
            quote: quote_changed.then(|| self.request_quote(FetchKind::Input)).flatten(),
            balance: balance_changed.then(|| self.request_balance()).flatten(),
        }
    }

    pub fn set_from_token(&mut self, token: Option<Token>) -> InputUpdate {
        self.set_inputs(QuoteInputs { from_token: token, ..self.inputs.clone() })
    }

    pub fn set_to_token(&mut self, token: Option<Token>) -> InputUpdate {
        self.set_inputs(QuoteInputs { to_token: token, ..self.inputs.clone() })
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) -> InputUpdate {
        self.set_inputs(QuoteInputs { amount: amount.into(), ..self.inputs.clone() })
    }

    pub fn set_sender(&mut self, sender: Option<Address>) -> InputUpdate {
        self.set_inputs(QuoteInputs { sender, ..self.inputs.clone() })
    }

    /// Swaps from- and to-token, as an input change.
    pub fn switch_direction(&mut self) -> InputUpdate {
        let mut inputs = self.inputs.clone();
        std::mem::swap(&mut inputs.from_token, &mut inputs.to_token);
        self.set_inputs(inputs)
    }

    /// Starts a quote fetch for the current inputs.
    ///
    /// Invalid inputs (a missing token, an amount that is not a positive
    /// decimal) reset the session silently and return `None`. Otherwise a
    /// new sequence number is issued, superseding any fetch in flight.
    pub fn request_quote(&mut self, kind: FetchKind) -> Option<FetchTicket> {
        let Some(request) = self.build_request() else {
            self.reset();
            return None;
        };

        self.seq += 1;
        self.in_flight = Some((self.seq, kind));
        self.session.is_fetching = true;
        self.session.is_manual_refresh_in_flight = kind == FetchKind::Manual;
        self.session.last_error = None;

        if kind == FetchKind::Input {
            // The displayed quote no longer matches the inputs
            self.session.clear_quote();
            self.session.expiry_remaining = self.config.validity_seconds;
            self.anchor = None;
        }

        debug!(
            seq = self.seq,
            ?kind,
            from = %request.from,
            to = %request.to,
            amount = %request.amount,
            "quote requested"
        );
        Some(FetchTicket { seq: self.seq, kind, request })
    }

    /// User refresh. Ignored while any quote fetch is in flight.
    pub fn manual_refresh(&mut self) -> Option<FetchTicket> {
        if self.in_flight.is_some() {
            debug!("manual refresh ignored, fetch in flight");
            return None;
        }
        self.request_quote(FetchKind::Manual)
    }

    /// Applies the result of a quote fetch.
    ///
    /// Returns `false` and leaves the session untouched if `seq` is not the
    /// latest issued fetch.
    pub fn complete(&mut self, seq: u64, result: Result<Quote, ToolsError>, now: Instant) -> bool {
        match self.in_flight {
            Some((latest, _)) if latest == seq => {},
            _ => {
                debug!(seq, latest = self.seq, "stale quote response discarded");
                return false;
            },
        }

        self.in_flight = None;
        self.session.is_fetching = false;
        self.session.is_manual_refresh_in_flight = false;
        self.session.expiry_remaining = self.config.validity_seconds;

        match result {
            Ok(quote) => {
                let best_route = select_best_route(&quote).to_vec();
                debug!(seq, output = %quote.output_formatted, "quote received");
                self.session.set_quote(quote, best_route);
                self.session.fetched_at = Some(Utc::now());
                self.session.last_error = None;
                self.anchor = Some(now);
            },
            Err(err) => {
                warn!(seq, %err, "quote fetch failed");
                self.session.clear_quote();
                self.session.last_error = Some(err.display_message());
                self.anchor = None;
            },
        }
        true
    }

    /// Recomputes the seconds left in the validity window.
    ///
    /// When they reach zero the countdown stops and one refetch is issued,
    /// unless a fetch is already in flight. The countdown is re-armed by the
    /// completion of that fetch.
    pub fn tick(&mut self, now: Instant) -> Tick {
        let Some(anchor) = self.anchor else {
            return Tick::Idle;
        };

        let elapsed = now.saturating_duration_since(anchor).as_secs();
        let remaining = self.config.validity_seconds.saturating_sub(elapsed);
        self.session.expiry_remaining = remaining;
        if remaining > 0 {
            return Tick::Remaining(remaining);
        }

        self.anchor = None;
        if self.in_flight.is_some() {
            return Tick::Expired(None);
        }
        debug!("quote expired");
        Tick::Expired(self.request_quote(FetchKind::Expiry))
    }

    /// Starts a balance fetch for the current sender and from-token.
    ///
    /// Without either the balance is cleared and `None` returned.
    pub fn request_balance(&mut self) -> Option<BalanceTicket> {
        self.balance_seq += 1;
        let (Some(wallet), Some(token)) =
            (self.inputs.sender, token_address(&self.inputs.from_token))
        else {
            self.balance_in_flight = None;
            self.session.from_balance = None;
            self.session.balance_loading = false;
            return None;
        };

        self.balance_in_flight = Some(self.balance_seq);
        self.session.balance_loading = true;
        Some(BalanceTicket { seq: self.balance_seq, wallet, token })
    }

    /// Applies wallet balances to the from-token balance.
    ///
    /// A token missing from the wallet has balance `"0"`; a failed fetch
    /// clears the balance. Returns `false` for superseded fetches.
    pub fn complete_balance(
        &mut self,
        ticket: &BalanceTicket,
        result: Result<Vec<TokenBalance>, ToolsError>,
    ) -> bool {
        if self.balance_in_flight != Some(ticket.seq) {
            debug!(seq = ticket.seq, "stale balance response discarded");
            return false;
        }

        self.balance_in_flight = None;
        self.session.balance_loading = false;
        self.session.from_balance = match result {
            Ok(balances) => Some(
                balances
                    .into_iter()
                    .find(|balance| balance.address == ticket.token)
                    .map(|balance| balance.balance)
                    .unwrap_or_else(|| "0".to_string()),
            ),
            Err(err) => {
                warn!(%err, "balance fetch failed");
                None
            },
        };
        true
    }

    fn build_request(&self) -> Option<QuoteRequest> {
        let from = self.inputs.from_token.as_ref()?;
        let to = self.inputs.to_token.as_ref()?;
        num::parse_amount(&self.inputs.amount)?;

        Some(QuoteRequest {
            from: from.address,
            to: to.address,
            amount: num::normalize_amount(&self.inputs.amount),
            sender: self.inputs.sender,
            deadline: self.config.deadline_seconds,
            source: self.config.source.clone(),
            max_slippage: self.config.max_slippage,
            max_hops: self.config.max_hops,
            excluded_protocols: self.config.excluded_protocols.clone(),
        })
    }

    /// Back to the empty session, discarding any fetch in flight.
    fn reset(&mut self) {
        self.in_flight = None;
        self.anchor = None;
        self.session.clear_quote();
        self.session.last_error = None;
        self.session.expiry_remaining = self.config.validity_seconds;
        self.session.is_fetching = false;
        self.session.is_manual_refresh_in_flight = false;
    }
}

fn token_address(token: &Option<Token>) -> Option<Address> { token.as_ref().map(|t| t.address) }

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use alloy::primitives::address;

    use super::*;
    use crate::testing;

    fn lifecycle() -> QuoteLifecycle { QuoteLifecycle::new(QuoteConfig::default()) }

    fn quote(output: &str) -> Quote {
        Quote {
            input_formatted: "10".to_string(),
            output_formatted: output.to_string(),
            min_output_formatted: "9.90".to_string(),
            ..Default::default()
        }
    }

    fn mon_usdc(amount: &str) -> QuoteInputs {
        QuoteInputs::new(testing::mon(), testing::usdc(), amount)
    }

    #[test]
    fn test_valid_inputs_fetch_and_complete() {
        let mut lc = lifecycle();
        let now = Instant::now();

        let ticket = lc.set_inputs(mon_usdc("10")).quote.unwrap();
        assert_eq!(ticket.kind, FetchKind::Input);
        assert_eq!(ticket.request.amount, "10");
        assert_eq!(ticket.request.sender, None);
        assert_eq!(ticket.request.deadline, 60);
        assert_eq!(ticket.request.source, "montools");
        assert!(lc.session().is_fetching);
        assert!(!lc.session().is_manual_refresh_in_flight);

        assert!(lc.complete(ticket.seq, Ok(quote("9.95")), now));
        let session = lc.session();
        assert!(!session.is_fetching);
        assert_eq!(session.output, "9.95");
        assert_eq!(session.price, "0.995");
        assert_eq!(session.min_received, "9.90");
        assert_eq!(session.expiry_remaining, 60);
        assert!(session.fetched_at.is_some());
        assert!(session.last_error.is_none());
        assert!(lc.is_counting_down());
    }

    #[test]
    fn test_failure_sets_error() {
        let mut lc = lifecycle();
        let ticket = lc.set_inputs(mon_usdc("10")).quote.unwrap();

        let err = ToolsError::Api { status: 400, message: "no route found".to_string() };
        assert!(lc.complete(ticket.seq, Err(err), Instant::now()));
        let session = lc.session();
        assert!(!session.is_fetching);
        assert!(session.quote.is_none());
        assert!(session.output.is_empty());
        assert!(session.fetched_at.is_none());
        assert_eq!(session.last_error.as_deref(), Some("no route found"));
        assert!(!lc.is_counting_down());

        // Next attempt clears the error
        lc.manual_refresh().unwrap();
        assert!(lc.session().last_error.is_none());
    }

    #[test]
    fn test_invalid_amounts_never_fetch() {
        for amount in ["", "0", "-5", "abc", "10,", "0.0", "1e3"] {
            let mut lc = lifecycle();
            let update = lc.set_inputs(mon_usdc(amount));
            assert!(update.quote.is_none(), "amount {:?} fetched", amount);
            assert!(lc.session().quote.is_none());
            assert!(!lc.session().is_fetching);
        }

        // Missing token
        let mut lc = lifecycle();
        assert!(lc.set_amount("10").quote.is_none());
        assert!(lc.set_from_token(Some(testing::mon())).quote.is_none());
        assert!(lc.set_to_token(Some(testing::usdc())).quote.is_some());
    }

    #[test]
    fn test_trailing_comma_then_completed() {
        let mut lc = lifecycle();
        let now = Instant::now();
        let ticket = lc.set_inputs(mon_usdc("10")).quote.unwrap();
        lc.complete(ticket.seq, Ok(quote("9.95")), now);

        // Mid-edit: resets without a fetch
        assert!(lc.set_amount("10,").quote.is_none());
        assert!(lc.session().quote.is_none());
        assert!(lc.session().last_error.is_none());
        assert_eq!(lc.session().expiry_remaining, 60);
        assert!(!lc.is_counting_down());

        let ticket = lc.set_amount("10,5").quote.unwrap();
        assert_eq!(ticket.request.amount, "10.5");
    }

    #[test]
    fn test_invalid_input_discards_in_flight() {
        let mut lc = lifecycle();
        let ticket = lc.set_inputs(mon_usdc("10")).quote.unwrap();
        lc.set_amount("");
        assert!(!lc.complete(ticket.seq, Ok(quote("9.95")), Instant::now()));
        assert!(lc.session().quote.is_none());
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut lc = lifecycle();
        let now = Instant::now();
        let first = lc.set_inputs(mon_usdc("10")).quote.unwrap();
        let second = lc.set_amount("20").quote.unwrap();
        assert!(second.seq > first.seq);

        assert!(lc.complete(second.seq, Ok(quote("19.9")), now));
        // Older response arrives late
        assert!(!lc.complete(first.seq, Ok(quote("9.95")), now));
        assert_eq!(lc.session().output, "19.9");

        // Also when the older one resolves while the newer is pending
        let third = lc.set_amount("30").quote.unwrap();
        let fourth = lc.set_amount("40").quote.unwrap();
        assert!(!lc.complete(third.seq, Ok(quote("29.8")), now));
        assert!(lc.session().is_fetching);
        assert!(lc.complete(fourth.seq, Ok(quote("39.7")), now));
        assert_eq!(lc.session().output, "39.7");
    }

    #[test]
    fn test_unchanged_inputs_do_nothing() {
        let mut lc = lifecycle();
        lc.set_inputs(mon_usdc("10")).quote.unwrap();
        assert_eq!(lc.set_inputs(mon_usdc("10")), InputUpdate::default());
    }

    #[test]
    fn test_sender_change_refetches() {
        let mut lc = lifecycle();
        let wallet = address!("0x00000000000000000000000000000000000000aa");
        lc.set_inputs(mon_usdc("10"));

        let update = lc.set_sender(Some(wallet));
        assert_eq!(update.quote.unwrap().request.sender, Some(wallet));
        let balance = update.balance.unwrap();
        assert_eq!(balance.wallet, wallet);
        assert_eq!(balance.token, testing::mon().address);

        // Disconnect clears the balance
        let update = lc.set_sender(None);
        assert!(update.quote.is_some());
        assert!(update.balance.is_none());
        assert!(lc.session().from_balance.is_none());
    }

    #[test]
    fn test_tick_counts_down_and_expires_once() {
        let mut lc = lifecycle();
        let start = Instant::now();
        assert_eq!(lc.tick(start), Tick::Idle);

        let ticket = lc.set_inputs(mon_usdc("10")).quote.unwrap();
        lc.complete(ticket.seq, Ok(quote("9.95")), start);

        let mut last = u64::MAX;
        let mut refetches = Vec::new();
        for second in 1..=70 {
            match lc.tick(start + Duration::from_secs(second)) {
                Tick::Remaining(remaining) => {
                    assert!(remaining < last);
                    assert_eq!(remaining, lc.session().expiry_remaining);
                    last = remaining;
                },
                Tick::Expired(ticket) => refetches.push(ticket),
                Tick::Idle => {},
            }
        }
        assert_eq!(last, 1);
        assert_eq!(refetches.len(), 1);
        let refetch = refetches.pop().flatten().unwrap();
        assert_eq!(refetch.kind, FetchKind::Expiry);
        assert_eq!(lc.session().expiry_remaining, 0);
        // Expired quote stays displayed until replaced
        assert_eq!(lc.session().output, "9.95");

        // Countdown resumes from the completion of the refetch
        let done = start + Duration::from_secs(75);
        lc.complete(refetch.seq, Ok(quote("9.96")), done);
        assert_eq!(lc.tick(done + Duration::from_secs(1)), Tick::Remaining(59));
    }

    #[test]
    fn test_expiry_does_not_overlap_fetch() {
        let mut lc = lifecycle();
        let start = Instant::now();
        let ticket = lc.set_inputs(mon_usdc("10")).quote.unwrap();
        lc.complete(ticket.seq, Ok(quote("9.95")), start);

        let manual = lc.manual_refresh().unwrap();
        assert!(lc.session().is_manual_refresh_in_flight);
        assert_eq!(lc.tick(start + Duration::from_secs(60)), Tick::Expired(None));

        lc.complete(manual.seq, Ok(quote("9.96")), start + Duration::from_secs(61));
        assert!(!lc.session().is_manual_refresh_in_flight);
        assert!(lc.is_counting_down());
    }

    #[test]
    fn test_failure_stops_countdown() {
        let mut lc = lifecycle();
        let start = Instant::now();
        let ticket = lc.set_inputs(mon_usdc("10")).quote.unwrap();
        lc.complete(ticket.seq, Err(ToolsError::InvalidRequest("down".to_string())), start);
        assert_eq!(lc.tick(start + Duration::from_secs(90)), Tick::Idle);
        assert_eq!(lc.session().expiry_remaining, 60);
    }

    #[test]
    fn test_manual_refresh_ignored_while_fetching() {
        let mut lc = lifecycle();
        assert!(lc.manual_refresh().is_none());

        let ticket = lc.set_inputs(mon_usdc("10")).quote.unwrap();
        assert!(lc.manual_refresh().is_none());
        assert!(!lc.session().can_refresh());

        lc.complete(ticket.seq, Ok(quote("9.95")), Instant::now());
        let manual = lc.manual_refresh().unwrap();
        assert_eq!(manual.kind, FetchKind::Manual);
        assert!(lc.session().is_fetching);
        assert!(lc.session().is_manual_refresh_in_flight);
        // Previous quote stays displayed during the refresh
        assert_eq!(lc.session().output, "9.95");
    }

    #[test]
    fn test_switch_direction_twice_restores_pair() {
        let mut lc = lifecycle();
        lc.set_inputs(mon_usdc("10"));

        let ticket = lc.switch_direction().quote.unwrap();
        assert_eq!(ticket.request.from, testing::usdc().address);
        assert_eq!(ticket.request.to, testing::mon().address);

        lc.switch_direction();
        assert_eq!(lc.inputs(), &mon_usdc("10"));
    }

    #[test]
    fn test_balance_lookup() {
        let mut lc = lifecycle();
        let wallet = address!("0x00000000000000000000000000000000000000aa");
        let ticket = lc.set_inputs(mon_usdc("10").with_sender(wallet)).balance.unwrap();
        assert!(lc.session().balance_loading);

        let balances = vec![TokenBalance {
            address: testing::mon().address,
            balance: "12.5".to_string(),
            ..Default::default()
        }];
        assert!(lc.complete_balance(&ticket, Ok(balances)));
        assert_eq!(lc.session().from_balance.as_deref(), Some("12.5"));
        assert!(!lc.session().balance_loading);

        // Token not held
        let ticket = lc.switch_direction().balance.unwrap();
        assert!(lc.complete_balance(&ticket, Ok(Vec::new())));
        assert_eq!(lc.session().from_balance.as_deref(), Some("0"));

        // Failure clears
        let ticket = lc.switch_direction().balance.unwrap();
        let stale = ticket;
        let ticket = lc.request_balance().unwrap();
        assert!(!lc.complete_balance(&stale, Ok(Vec::new())));
        assert!(lc.complete_balance(&ticket, Err(ToolsError::InvalidRequest("x".to_string()))));
        assert!(lc.session().from_balance.is_none());
    }
}
