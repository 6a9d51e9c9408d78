use std::sync::Arc;

use alloy::primitives::Address;
use tokio::{
    sync::{mpsc, watch},
    task::{JoinError, JoinHandle, JoinSet},
    time::Instant,
};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

use super::{
    BalanceTicket, ExpiryTimer, FetchTicket, InputUpdate, QuoteConfig, QuoteInputs,
    QuoteLifecycle, QuoteSession, Tick,
};
use crate::{
    api::{BalanceSource, QuoteSource},
    error::ToolsError,
    types::{Quote, Token, TokenBalance},
};

type QuoteResult = (u64, Result<Quote, ToolsError>);
type BalanceResult = (BalanceTicket, Result<Vec<TokenBalance>, ToolsError>);

#[derive(Debug)]
enum Command {
    Inputs(QuoteInputs),
    FromToken(Option<Token>),
    ToToken(Option<Token>),
    Amount(String),
    Sender(Option<Address>),
    SwitchDirection,
    ManualRefresh,
}

/// Handle to a running quote lifecycle.
///
/// Spawns a task that owns a [`QuoteLifecycle`], runs its fetches against the
/// injected sources and drives its countdown with an [`ExpiryTimer`]. Every
/// state change is published as a [`QuoteSession`] snapshot.
///
/// The task stops when the handle is dropped or [`QuoteController::shutdown`]
/// is called; fetches still in flight are aborted.
#[derive(derive_more::Debug)]
pub struct QuoteController {
    commands: mpsc::UnboundedSender<Command>,
    session: watch::Receiver<QuoteSession>,
    #[debug(skip)]
    task: JoinHandle<()>,
    #[debug(skip)]
    _guard: DropGuard,
}

impl QuoteController {
    /// Starts the controller with initial inputs. Must be called within a
    /// Tokio runtime.
    pub fn spawn<Q, B>(config: QuoteConfig, quotes: Q, balances: B, inputs: QuoteInputs) -> Self
    where
        Q: QuoteSource + 'static,
        B: BalanceSource + 'static,
    {
        let cancellation_token = CancellationToken::new();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (session_tx, session) =
            watch::channel(QuoteSession::new(config.validity_seconds));

        let driver = Driver {
            timer: ExpiryTimer::new(config.tick_interval),
            lifecycle: QuoteLifecycle::new(config),
            quotes: Arc::new(quotes),
            balances: Arc::new(balances),
            quote_tasks: JoinSet::new(),
            balance_tasks: JoinSet::new(),
            session_tx,
        };
        let task = tokio::spawn(driver.run(inputs, command_rx, cancellation_token.clone()));

        Self { commands, session, task, _guard: cancellation_token.drop_guard() }
    }

    /// Latest session snapshot.
    pub fn session(&self) -> QuoteSession { self.session.borrow().clone() }

    /// Receiver notified on every session change.
    pub fn subscribe(&self) -> watch::Receiver<QuoteSession> { self.session.clone() }

    pub fn set_inputs(&self, inputs: QuoteInputs) { self.send(Command::Inputs(inputs)) }

    pub fn set_from_token(&self, token: Option<Token>) { self.send(Command::FromToken(token)) }

    pub fn set_to_token(&self, token: Option<Token>) { self.send(Command::ToToken(token)) }

    pub fn set_amount(&self, amount: impl Into<String>) {
        self.send(Command::Amount(amount.into()))
    }

    /// Connects (`Some`) or disconnects (`None`) the wallet.
    pub fn set_sender(&self, sender: Option<Address>) { self.send(Command::Sender(sender)) }

    pub fn switch_direction(&self) { self.send(Command::SwitchDirection) }

    /// Requests a refresh, ignored while a fetch is in flight.
    pub fn manual_refresh(&self) { self.send(Command::ManualRefresh) }

    /// Stops the controller and waits for its task to finish.
    pub async fn shutdown(self) {
        let Self { task, _guard, .. } = self;
        drop(_guard);
        if let Err(err) = task.await {
            warn!(%err, "quote controller task failed");
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("quote controller stopped, command dropped");
        }
    }
}

struct Driver {
    lifecycle: QuoteLifecycle,
    quotes: Arc<dyn QuoteSource>,
    balances: Arc<dyn BalanceSource>,
    timer: ExpiryTimer,
    quote_tasks: JoinSet<QuoteResult>,
    balance_tasks: JoinSet<BalanceResult>,
    session_tx: watch::Sender<QuoteSession>,
}

impl Driver {
    async fn run(
        mut self,
        inputs: QuoteInputs,
        mut commands: mpsc::UnboundedReceiver<Command>,
        cancellation_token: CancellationToken,
    ) {
        debug!("quote controller started");
        let update = self.lifecycle.set_inputs(inputs);
        self.dispatch(update);
        self.publish();

        loop {
            let mut rearm = false;
            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(joined) = self.quote_tasks.join_next() => {
                    rearm = self.on_quote(joined);
                },
                Some(joined) = self.balance_tasks.join_next() => self.on_balance(joined),
                _ = self.timer.tick() => self.on_tick(),
            }
            self.sync_timer(rearm);
            self.publish();
        }

        self.timer.stop();
        self.quote_tasks.abort_all();
        self.balance_tasks.abort_all();
        debug!("quote controller stopped");
    }

    fn handle(&mut self, command: Command) {
        let update = match command {
            Command::Inputs(inputs) => self.lifecycle.set_inputs(inputs),
            Command::FromToken(token) => self.lifecycle.set_from_token(token),
            Command::ToToken(token) => self.lifecycle.set_to_token(token),
            Command::Amount(amount) => self.lifecycle.set_amount(amount),
            Command::Sender(sender) => self.lifecycle.set_sender(sender),
            Command::SwitchDirection => self.lifecycle.switch_direction(),
            Command::ManualRefresh => {
                InputUpdate { quote: self.lifecycle.manual_refresh(), balance: None }
            },
        };
        self.dispatch(update);
    }

    fn dispatch(&mut self, update: InputUpdate) {
        if let Some(ticket) = update.quote {
            self.spawn_quote(ticket);
        }
        if let Some(ticket) = update.balance {
            self.spawn_balance(ticket);
        }
    }

    fn spawn_quote(&mut self, ticket: FetchTicket) {
        let quotes = self.quotes.clone();
        self.quote_tasks.spawn(async move {
            let result = quotes.quote(&ticket.request).await;
            (ticket.seq, result)
        });
    }

    fn spawn_balance(&mut self, ticket: BalanceTicket) {
        let balances = self.balances.clone();
        self.balance_tasks.spawn(async move {
            let result = balances.wallet_balances(ticket.wallet).await;
            (ticket, result)
        });
    }

    /// Returns whether a new quote was applied.
    fn on_quote(&mut self, joined: Result<QuoteResult, JoinError>) -> bool {
        match joined {
            Ok((seq, result)) => {
                let applied_quote = result.is_ok();
                self.lifecycle.complete(seq, result, Instant::now()) && applied_quote
            },
            Err(err) => {
                warn!(%err, "quote fetch task failed");
                false
            },
        }
    }

    fn on_balance(&mut self, joined: Result<BalanceResult, JoinError>) {
        match joined {
            Ok((ticket, result)) => {
                self.lifecycle.complete_balance(&ticket, result);
            },
            Err(err) => warn!(%err, "balance fetch task failed"),
        }
    }

    fn on_tick(&mut self) {
        if let Tick::Expired(Some(ticket)) = self.lifecycle.tick(Instant::now()) {
            self.spawn_quote(ticket);
        }
    }

    /// Keeps the timer running exactly while the lifecycle counts down,
    /// restarting its cadence when a new quote arrived.
    fn sync_timer(&mut self, rearm: bool) {
        if !self.lifecycle.is_counting_down() {
            self.timer.stop();
        } else if rearm {
            self.timer.reset();
        } else {
            self.timer.start();
        }
    }

    fn publish(&self) {
        let session = self.lifecycle.session();
        self.session_tx.send_if_modified(|current| {
            if current == session {
                return false;
            }
            *current = session.clone();
            true
        });
    }
}
