pub mod args;
mod inspect;
mod quote;
mod tokens;
mod tx;

use std::time::Duration;

use alloy::{
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::client::RpcClient,
    transports::layers::{RetryBackoffLayer, ThrottleLayer},
};
use anyhow::Context;
use args::{Cli, Commands};
use montools_sdk::{
    Chain,
    api::MonorailClient,
    cache::{self, TokenMetaCache},
};
use tokio_util::sync::CancellationToken;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let chain = chain(&cli);

    let http = reqwest::Client::builder()
        .user_agent(concat!("montools/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(15))
        .build()
        .context("building HTTP client")?;
    let mut monorail = MonorailClient::new(http, &chain);
    if let Some(app_id) = &cli.app_id {
        monorail = monorail.with_app_id(app_id);
    }

    let cancellation_signal = CancellationToken::new();
    let cancellation_token = cancellation_signal.child_token();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to install CTRL+C signal handler");
            return;
        }
        cancellation_signal.cancel();
    });

    match cli.command {
        Commands::Quote(args) => quote::render(&chain, monorail, args, cancellation_token).await?,
        Commands::Balances { address } => tokens::render_balances(&monorail, address).await?,
        Commands::Tokens { category, find, limit } => {
            tokens::render_tokens(&monorail, category, find, limit).await?
        },
        Commands::Inspect { address } => {
            let address = cache::validate_address(&address)
                .with_context(|| format!("invalid address: {:?}", address))?;
            inspect::render_standard(&connect(&cli.rpc, cli.rpc_throttle, &chain).await?, address)
                .await?
        },
        Commands::Meta { address } => {
            let address = cache::validate_address(&address)
                .with_context(|| format!("invalid address: {:?}", address))?;
            let provider = connect(&cli.rpc, cli.rpc_throttle, &chain).await?;
            inspect::render_meta(&provider, &TokenMetaCache::new(), address).await?
        },
        Commands::Tx { hash } => {
            tx::render(&chain, connect(&cli.rpc, cli.rpc_throttle, &chain).await?, hash).await?
        },
    }

    Ok(())
}

/// Testnet endpoints with command line overrides applied.
fn chain(cli: &Cli) -> Chain {
    let testnet = Chain::testnet();
    Chain::custom(
        testnet.chain_id(),
        cli.rpc.as_deref().unwrap_or(testnet.rpc_url()),
        cli.quote_api.as_deref().unwrap_or(testnet.quote_api()),
        cli.data_api.as_deref().unwrap_or(testnet.data_api()),
        testnet.explorer(),
    )
}

async fn connect(
    rpc: &Option<String>,
    rpc_throttle: Option<u32>,
    chain: &Chain,
) -> anyhow::Result<DynProvider> {
    let client = if rpc.is_none() || rpc_throttle.is_some() {
        // Apply throttling with default RPC
        RpcClient::builder()
            .layer(ThrottleLayer::new(rpc_throttle.unwrap_or(args::DEFAULT_RPC_THROTTLING)))
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect(chain.rpc_url())
            .await
            .context("connecting to RPC")?
    } else {
        RpcClient::builder()
            .layer(RetryBackoffLayer::new(10, 100, 200))
            .connect(chain.rpc_url())
            .await
            .context("connecting to RPC")?
    };
    client.set_poll_interval(Duration::from_millis(100));
    let provider = ProviderBuilder::new().connect_client(client);

    let chain_id = provider.get_chain_id().await.context("fetching chain ID")?;
    if chain_id != chain.chain_id() {
        tracing::warn!(chain_id, expected = chain.chain_id(), "RPC serves a different chain");
    }
    Ok(provider.erased())
}
