use std::io::Write;

use alloy::primitives::Address;
use anyhow::{Context, bail};
use colored::Colorize;
use crossterm::{
    QueueableCommand,
    cursor::MoveTo,
    execute,
    style::Print,
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use montools_sdk::{
    Chain,
    api::{MonorailClient, TokenQuery},
    cache, num,
    quote::{QuoteConfig, QuoteController, QuoteInputs, QuoteSession},
    types::Token,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::args::QuoteArgs;

pub(crate) async fn render(
    chain: &Chain,
    client: MonorailClient,
    args: QuoteArgs,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    if num::parse_amount(&args.amount).is_none() {
        bail!("invalid amount: {:?}", args.amount);
    }

    let from = resolve_token(chain, &client, &args.from).await?;
    let to = resolve_token(chain, &client, &args.to).await?;

    let config = QuoteConfig {
        max_slippage: args.max_slippage,
        max_hops: args.max_hops,
        ..Default::default()
    };
    let inputs = QuoteInputs { sender: args.sender, ..QuoteInputs::new(from, to, args.amount) };
    let pair = Pair::new(&inputs);
    let controller = QuoteController::spawn(config, client.clone(), client, inputs);

    if args.watch {
        watch(controller, pair, cancellation_token).await
    } else {
        once(controller, pair, cancellation_token).await
    }
}

/// Token by address, native symbol or listed symbol.
async fn resolve_token(chain: &Chain, client: &MonorailClient, token: &str) -> anyhow::Result<Token> {
    let native = || Token::new(Address::ZERO, chain.native_symbol(), 18);

    if let Some(address) = cache::validate_address(token) {
        if address.is_zero() {
            return Ok(native());
        }
        return client.token(address).await.with_context(|| format!("fetching token {}", address));
    }
    if token.eq_ignore_ascii_case(chain.native_symbol()) {
        return Ok(native());
    }

    let query = TokenQuery { find: Some(token.to_string()), limit: Some(20), ..Default::default() };
    client
        .tokens(&query)
        .await
        .with_context(|| format!("searching token {:?}", token))?
        .into_iter()
        .find(|listed| listed.symbol.eq_ignore_ascii_case(token))
        .with_context(|| format!("unknown token: {:?}", token))
}

async fn once(
    controller: QuoteController,
    pair: Pair,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let mut rx = controller.subscribe();
    let session = tokio::select! {
        _ = cancellation_token.cancelled() => None,
        res = rx.wait_for(|s| !s.is_fetching && (s.quote.is_some() || s.last_error.is_some())) => {
            Some(res.context("quote controller stopped")?.clone())
        },
    };
    controller.shutdown().await;

    let Some(session) = session else {
        return Ok(());
    };
    if let Some(err) = session.last_error {
        bail!("quote failed: {}", err);
    }
    println!("\n{}\n", pair.to_string().bold());
    println!("{:#}", session);
    Ok(())
}

async fn watch(
    controller: QuoteController,
    mut pair: Pair,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, Clear(ClearType::All), MoveTo(0, 0))?;

    let res = watch_loop(&controller, &mut pair, &mut stdout, cancellation_token).await;

    execute!(stdout, LeaveAlternateScreen)?;
    controller.shutdown().await;
    res
}

async fn watch_loop(
    controller: &QuoteController,
    pair: &mut Pair,
    stdout: &mut std::io::Stdout,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let mut rx = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        let session = rx.borrow_and_update().clone();
        draw(stdout, pair, &session)?;

        tokio::select! {
            _ = cancellation_token.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            },
            line = lines.next_line(), if stdin_open => match line? {
                None => stdin_open = false,
                Some(line) => match line.trim() {
                    "" => controller.manual_refresh(),
                    "q" | "quit" => break,
                    "s" => {
                        controller.switch_direction();
                        pair.switch();
                    },
                    amount => {
                        controller.set_amount(amount);
                        pair.amount = amount.to_string();
                    },
                },
            },
        }
    }

    Ok(())
}

fn draw(stdout: &mut std::io::Stdout, pair: &Pair, session: &QuoteSession) -> anyhow::Result<()> {
    stdout.queue(Clear(ClearType::All))?;
    stdout.queue(MoveTo(0, 0))?;
    stdout.queue(Print(format!("{}\n\n", pair.to_string().bold())))?;
    stdout.queue(Print(format!("{:#}", session)))?;

    let refresh = if session.can_refresh() { "[enter] refresh".normal() } else { "[enter] refresh".dimmed() };
    stdout.queue(Print(format!(
        "\n{}  {}  {}  {}\n> ",
        refresh,
        "[s] switch",
        "[<amount>] set amount",
        "[q] quit"
    )))?;
    stdout.flush()?;
    Ok(())
}

/// Swap direction and amount as typed, for the header line.
struct Pair {
    from: String,
    to: String,
    amount: String,
}

impl Pair {
    fn new(inputs: &QuoteInputs) -> Self {
        let symbol = |token: &Option<Token>| token.as_ref().map(|t| t.symbol.clone()).unwrap_or_default();
        Self {
            from: symbol(&inputs.from_token),
            to: symbol(&inputs.to_token),
            amount: inputs.amount.clone(),
        }
    }

    fn switch(&mut self) { std::mem::swap(&mut self.from, &mut self.to); }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Swap {} {} -> {}", self.amount, self.from, self.to)
    }
}
