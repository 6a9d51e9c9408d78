use alloy::{primitives::Address, providers::Provider};
use colored::Colorize;
use montools_sdk::{
    cache::{self, TokenMetaCache},
    inspect::{self, TokenInfo},
};

pub(crate) async fn render_standard<P: Provider + Sync>(
    provider: &P,
    address: Address,
) -> anyhow::Result<()> {
    let info = inspect::detect(provider, address).await?;

    println!("\n{}\n", format!("**** Contract {}", address).bright_blue());
    println!("  Standard: {}", info.standard().to_string().bold());
    match info {
        TokenInfo::Erc20 { name, symbol, decimals, total_supply } => {
            println!("  Name: {}", name);
            println!("  Symbol: {}", symbol);
            println!("  Decimals: {}", decimals);
            println!("  Total supply: {}", total_supply);
        },
        TokenInfo::Erc721 { name, symbol } => {
            println!("  Name: {}", name);
            println!("  Symbol: {}", symbol);
        },
        TokenInfo::Erc1155 { name, symbol } => {
            println!("  Name: {}", name.as_deref().unwrap_or("-"));
            println!("  Symbol: {}", symbol.as_deref().unwrap_or("-"));
        },
        TokenInfo::Unknown => {
            println!("{}", "  No supported token interface found".yellow());
        },
    }
    println!();
    Ok(())
}

pub(crate) async fn render_meta<P: Provider>(
    provider: &P,
    cache: &TokenMetaCache,
    address: Address,
) -> anyhow::Result<()> {
    let meta = cache
        .get_or_fetch(address, |address| cache::fetch_erc20_meta(provider, address))
        .await?;

    println!("\n{}\n", format!("**** Token {}", address).bright_blue());
    println!("  Name: {}", meta.name);
    println!("  Symbol: {}", meta.symbol.bold());
    println!("  Decimals: {}", meta.decimals);
    println!();
    Ok(())
}
