use alloy::{network::ReceiptResponse, primitives::TxHash, providers::Provider};
use colored::Colorize;
use montools_sdk::{Chain, error::ToolsError};

pub(crate) async fn render<P: Provider>(chain: &Chain, provider: P, tx_hash: TxHash) -> anyhow::Result<()> {
    let receipt = provider
        .get_transaction_receipt(tx_hash)
        .await
        .map_err(ToolsError::from)?
        .ok_or(ToolsError::InvalidRequest("Transaction not found".to_string()))?;

    println!("\n{}\n", format!("**** Tx {}", tx_hash).bright_blue());
    if receipt.status() {
        println!("  Status: {}", "confirmed".green());
    } else {
        println!("  Status: {}", "reverted".red());
    }
    if let Some(block) = receipt.block_number() {
        println!("  Block: {}", block);
    }
    println!("  From: {}", receipt.from());
    if let Some(to) = receipt.to() {
        println!("  To: {}", to);
    }
    println!("  Gas used: {}", receipt.gas_used());
    println!("  Explorer: {}", chain.tx_url(tx_hash).underline());
    println!();

    Ok(())
}
