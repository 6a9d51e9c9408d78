use alloy::primitives::{Address, TxHash};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

pub(crate) const DEFAULT_RPC_THROTTLING: u32 = 15;

#[derive(Parser, Debug)]
#[command(name = "montools", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// RPC endpoint to connect to [default: Monad testnet RPC]
    #[arg(long, global = true, env = "MONTOOLS_RPC")]
    pub rpc: Option<String>,

    /// RPC throttling (req/sec) [default: 15 for default RPC provider and
    /// none for custom]
    #[arg(long, global = true)]
    pub rpc_throttle: Option<u32>,

    /// Base URL of the quote API [default: Monorail testnet pathfinder]
    #[arg(long, global = true, env = "MONORAIL_QUOTE_URL")]
    pub quote_api: Option<String>,

    /// Base URL of the token and wallet data API [default: Monorail testnet
    /// data API]
    #[arg(long, global = true, env = "MONORAIL_DATA_URL")]
    pub data_api: Option<String>,

    /// Application ID reported to the data API
    #[arg(long, global = true, env = "MONORAIL_APP_ID")]
    pub app_id: Option<String>,

    /// Log verbosity, logs are written to stderr
    #[arg(long, global = true, default_value_t = LevelFilter::WARN)]
    pub log_level: LevelFilter,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Quote a swap, once or live with auto-refresh
    Quote(QuoteArgs),
    /// Show token balances of a wallet
    Balances {
        /// Wallet address
        address: Address,
    },
    /// List tokens available for swapping
    Tokens {
        /// Only tokens of this category (verified, stable, lst, bridged, meme)
        #[arg(long)]
        category: Option<String>,

        /// Free text search by symbol, name or address
        #[arg(long)]
        find: Option<String>,

        /// Maximum number of tokens to list
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Detect the token standard of a contract
    Inspect {
        /// Contract address
        address: String,
    },
    /// Show ERC-20 metadata of a contract
    Meta {
        /// Contract address, `0x` prefix optional
        address: String,
    },
    /// Show the status of a transaction
    Tx {
        /// Transaction hash
        hash: TxHash,
    },
}

#[derive(Args, Debug)]
pub struct QuoteArgs {
    /// Token to sell, by symbol or address
    pub from: String,

    /// Token to buy, by symbol or address
    pub to: String,

    /// Amount to sell, either decimal separator
    #[arg(default_value = "1")]
    pub amount: String,

    /// Wallet the swap would be sent from
    #[arg(long)]
    pub sender: Option<Address>,

    /// Maximum slippage in basis points [default: API default]
    #[arg(long)]
    pub max_slippage: Option<u32>,

    /// Maximum number of hops [default: API default]
    #[arg(long)]
    pub max_hops: Option<u8>,

    /// Keep the quote live: refresh on expiry, read commands from stdin
    #[arg(long, short, default_value_t = false)]
    pub watch: bool,
}
