use alloy::primitives::Address;
use colored::Colorize;
use montools_sdk::{
    api::{MonorailClient, TokenQuery},
    types::TOKEN_CATEGORIES,
};
use tabled::{Table, Tabled, settings::Style};

pub(crate) async fn render_balances(client: &MonorailClient, wallet: Address) -> anyhow::Result<()> {
    let mut balances = client.wallet_balances(wallet).await?;
    balances.retain(|b| b.balance.trim().parse::<f64>().is_ok_and(|v| v > 0.0));
    balances.sort_by(|a, b| a.symbol.to_lowercase().cmp(&b.symbol.to_lowercase()));

    println!("\n{}\n", format!("**** Balances of {}", wallet).bright_blue());
    if balances.is_empty() {
        println!("{}\n", "No tokens held".dimmed());
        return Ok(());
    }

    let rows = balances.into_iter().map(|b| BalanceRow {
        symbol: b.symbol,
        name: b.name,
        balance: b.balance,
        value: b.mon_per_token.unwrap_or_else(|| "-".to_string()),
        address: b.address,
    });
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}\n", table);
    Ok(())
}

pub(crate) async fn render_tokens(
    client: &MonorailClient,
    category: Option<String>,
    find: Option<String>,
    limit: u32,
) -> anyhow::Result<()> {
    let query = TokenQuery { find, limit: Some(limit), ..Default::default() };
    let tokens = match category.as_deref() {
        Some(category) => {
            if !TOKEN_CATEGORIES.contains(&category) {
                anyhow::bail!(
                    "unknown category {:?}, expected one of: {}",
                    category,
                    TOKEN_CATEGORIES.join(", ")
                );
            }
            client.tokens_by_category(category, &query).await?
        },
        None => client.tokens(&query).await?,
    };
    let total = client.tokens_count().await?;

    println!(
        "\n{}\n",
        format!("**** Tokens ({} of {} listed)", tokens.len(), total).bright_blue()
    );

    let rows = tokens.into_iter().map(|t| TokenRow {
        symbol: t.symbol,
        name: t.name,
        decimals: t.decimals,
        categories: t.categories.join(", "),
        address: if t.address.is_zero() { "native".to_string() } else { t.address.to_string() },
    });
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}\n", table);
    Ok(())
}

#[derive(Tabled)]
struct BalanceRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "MON per Token")]
    value: String,
    #[tabled(rename = "Address")]
    address: Address,
}

#[derive(Tabled)]
struct TokenRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Decimals")]
    decimals: u8,
    #[tabled(rename = "Categories")]
    categories: String,
    #[tabled(rename = "Address")]
    address: String,
}
