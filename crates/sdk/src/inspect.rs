//! Token standard detection.
//!
//! A contract is classified by running an ordered list of [`TokenProbe`]s
//! against it; the first probe that succeeds decides. Every failed probe is
//! logged with its reason.

use alloy::{
    primitives::{Address, FixedBytes, utils::UnitsError},
    providers::Provider,
};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::{
    abi::{ERC721_INTERFACE_ID, ERC1155_INTERFACE_ID, IERC20, IERC165, IERC721Metadata},
    error::ToolsError,
    num,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenStandard {
    Erc20,
    Erc721,
    Erc1155,
    Unknown,
}

impl std::fmt::Display for TokenStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TokenStandard::Erc20 => "ERC-20",
            TokenStandard::Erc721 => "ERC-721",
            TokenStandard::Erc1155 => "ERC-1155",
            TokenStandard::Unknown => "unknown",
        })
    }
}

/// What a probe learned about a token contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenInfo {
    Erc20 {
        name: String,
        symbol: String,
        decimals: u8,
        /// Total supply in whole tokens.
        total_supply: String,
    },
    Erc721 {
        name: String,
        symbol: String,
    },
    /// Name and symbol are optional for ERC-1155.
    Erc1155 {
        name: Option<String>,
        symbol: Option<String>,
    },
    Unknown,
}

impl TokenInfo {
    pub fn standard(&self) -> TokenStandard {
        match self {
            TokenInfo::Erc20 { .. } => TokenStandard::Erc20,
            TokenInfo::Erc721 { .. } => TokenStandard::Erc721,
            TokenInfo::Erc1155 { .. } => TokenStandard::Erc1155,
            TokenInfo::Unknown => TokenStandard::Unknown,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("interface {0} not supported")]
    Unsupported(TokenStandard),

    #[error("call failed: {0}")]
    Call(#[from] alloy::contract::Error),

    #[error("invalid amount: {0}")]
    Units(#[from] UnitsError),
}

/// Check of one token standard against a contract.
#[async_trait]
pub trait TokenProbe<P: Sync>: Send + Sync {
    fn standard(&self) -> TokenStandard;

    async fn probe(&self, provider: &P, address: Address) -> Result<TokenInfo, ProbeError>;
}

/// ERC-20: all of `name`, `symbol`, `decimals` and `totalSupply` answer.
#[derive(Clone, Copy, Debug, Default)]
pub struct Erc20Probe;

/// ERC-721: ERC-165 reports the interface, then `name` and `symbol` answer.
#[derive(Clone, Copy, Debug, Default)]
pub struct Erc721Probe;

/// ERC-1155: ERC-165 reports the interface. Metadata is best effort.
#[derive(Clone, Copy, Debug, Default)]
pub struct Erc1155Probe;

#[async_trait]
impl<P: Provider + Sync> TokenProbe<P> for Erc20Probe {
    fn standard(&self) -> TokenStandard { TokenStandard::Erc20 }

    async fn probe(&self, provider: &P, address: Address) -> Result<TokenInfo, ProbeError> {
        let token = IERC20::new(address, provider);
        let name = token.name().call().await?;
        let symbol = token.symbol().call().await?;
        let decimals = token.decimals().call().await?;
        let total_supply = token.totalSupply().call().await?;

        Ok(TokenInfo::Erc20 {
            name,
            symbol,
            decimals,
            total_supply: num::from_base_units(total_supply, decimals)?,
        })
    }
}

#[async_trait]
impl<P: Provider + Sync> TokenProbe<P> for Erc721Probe {
    fn standard(&self) -> TokenStandard { TokenStandard::Erc721 }

    async fn probe(&self, provider: &P, address: Address) -> Result<TokenInfo, ProbeError> {
        if !supports_interface(provider, address, ERC721_INTERFACE_ID).await? {
            return Err(ProbeError::Unsupported(TokenStandard::Erc721));
        }
        let token = IERC721Metadata::new(address, provider);
        let name = token.name().call().await?;
        let symbol = token.symbol().call().await?;
        Ok(TokenInfo::Erc721 { name, symbol })
    }
}

#[async_trait]
impl<P: Provider + Sync> TokenProbe<P> for Erc1155Probe {
    fn standard(&self) -> TokenStandard { TokenStandard::Erc1155 }

    async fn probe(&self, provider: &P, address: Address) -> Result<TokenInfo, ProbeError> {
        if !supports_interface(provider, address, ERC1155_INTERFACE_ID).await? {
            return Err(ProbeError::Unsupported(TokenStandard::Erc1155));
        }
        let token = IERC721Metadata::new(address, provider);
        let name = token.name().call().await.ok();
        let symbol = token.symbol().call().await.ok();
        Ok(TokenInfo::Erc1155 { name, symbol })
    }
}

async fn supports_interface<P: Provider>(
    provider: &P,
    address: Address,
    interface_id: [u8; 4],
) -> Result<bool, ProbeError> {
    Ok(IERC165::new(address, provider)
        .supportsInterface(FixedBytes::from(interface_id))
        .call()
        .await?)
}

/// Detects the token standard of a deployed contract with the default
/// probes: ERC-20, ERC-721, ERC-1155.
pub async fn detect<P: Provider + Sync>(
    provider: &P,
    address: Address,
) -> Result<TokenInfo, ToolsError> {
    let probes: [&dyn TokenProbe<P>; 3] = [&Erc20Probe, &Erc721Probe, &Erc1155Probe];
    detect_with(provider, address, &probes).await
}

/// Detects the token standard of a deployed contract with custom probes.
///
/// Fails if the address holds no code; a contract no probe recognizes is
/// [`TokenInfo::Unknown`].
pub async fn detect_with<P: Provider + Sync>(
    provider: &P,
    address: Address,
    probes: &[&dyn TokenProbe<P>],
) -> Result<TokenInfo, ToolsError> {
    let code = provider.get_code_at(address).await?;
    if code.is_empty() {
        return Err(ToolsError::InvalidArgument(format!("{} is not a deployed contract", address)));
    }
    Ok(run_probes(provider, address, probes).await)
}

/// Runs probes in order until one succeeds.
pub async fn run_probes<P: Sync>(
    provider: &P,
    address: Address,
    probes: &[&dyn TokenProbe<P>],
) -> TokenInfo {
    for probe in probes {
        match probe.probe(provider, address).await {
            Ok(info) => {
                debug!(%address, standard = %probe.standard(), "token standard detected");
                return info;
            },
            Err(err) => debug!(%address, standard = %probe.standard(), %err, "probe failed"),
        }
    }
    TokenInfo::Unknown
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use alloy::{
        primitives::{U256, address},
        transports::mock::Asserter,
    };

    use super::*;
    use crate::testing::rpc;

    const TOKEN: Address = address!("0x00000000000000000000000000000000000000c1");
    const CODE: &[u8] = &[0x60, 0x80, 0x60, 0x40];

    struct Scripted {
        standard: TokenStandard,
        result: fn() -> Result<TokenInfo, ProbeError>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(standard: TokenStandard, result: fn() -> Result<TokenInfo, ProbeError>) -> Self {
            Self { standard, result, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl TokenProbe<()> for Scripted {
        fn standard(&self) -> TokenStandard { self.standard }

        async fn probe(&self, _: &(), _: Address) -> Result<TokenInfo, ProbeError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            (self.result)()
        }
    }

    fn nft() -> Result<TokenInfo, ProbeError> {
        Ok(TokenInfo::Erc721 { name: "Monad Punks".to_string(), symbol: "MPUNK".to_string() })
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let erc20 =
            Scripted::new(TokenStandard::Erc20, || Err(UnitsError::InvalidUnit("x".into()).into()));
        let erc721 = Scripted::new(TokenStandard::Erc721, nft);
        let erc1155 = Scripted::new(TokenStandard::Erc1155, || {
            Ok(TokenInfo::Erc1155 { name: None, symbol: None })
        });

        let info = run_probes(&(), Address::ZERO, &[&erc20, &erc721, &erc1155]).await;
        assert_eq!(info.standard(), TokenStandard::Erc721);
        assert_eq!(erc20.calls.load(Ordering::Relaxed), 1);
        assert_eq!(erc721.calls.load(Ordering::Relaxed), 1);
        assert_eq!(erc1155.calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_all_probes_fail() {
        let erc721 = Scripted::new(TokenStandard::Erc721, || {
            Err(ProbeError::Unsupported(TokenStandard::Erc721))
        });
        let erc1155 = Scripted::new(TokenStandard::Erc1155, || {
            Err(ProbeError::Unsupported(TokenStandard::Erc1155))
        });

        let info = run_probes(&(), Address::ZERO, &[&erc721, &erc1155]).await;
        assert_eq!(info, TokenInfo::Unknown);
        assert_eq!(run_probes(&(), Address::ZERO, &[]).await, TokenInfo::Unknown);
    }

    #[test]
    fn test_probe_error_message() {
        assert_eq!(
            ProbeError::Unsupported(TokenStandard::Erc1155).to_string(),
            "interface ERC-1155 not supported"
        );
    }

    #[tokio::test]
    async fn test_detect_requires_code() {
        let asserter = Asserter::new();
        rpc::push_code(&asserter, &[]);

        let err = detect(&rpc::mocked_provider(&asserter), TOKEN).await.unwrap_err();
        assert!(matches!(err, ToolsError::InvalidArgument(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_detect_erc20() {
        let asserter = Asserter::new();
        rpc::push_code(&asserter, CODE);
        rpc::push_return::<IERC20::nameCall>(&asserter, &"USD Coin".to_string());
        rpc::push_return::<IERC20::symbolCall>(&asserter, &"USDC".to_string());
        rpc::push_return::<IERC20::decimalsCall>(&asserter, &6);
        rpc::push_return::<IERC20::totalSupplyCall>(&asserter, &U256::from(1_500_000_250_000u64));

        let info = detect(&rpc::mocked_provider(&asserter), TOKEN).await.unwrap();
        assert_eq!(
            info,
            TokenInfo::Erc20 {
                name: "USD Coin".to_string(),
                symbol: "USDC".to_string(),
                decimals: 6,
                total_supply: "1500000.25".to_string(),
            }
        );
        assert!(asserter.read_q().is_empty());
    }

    #[tokio::test]
    async fn test_detect_erc721() {
        let asserter = Asserter::new();
        rpc::push_code(&asserter, CODE);
        rpc::push_revert(&asserter);
        rpc::push_return::<IERC165::supportsInterfaceCall>(&asserter, &true);
        rpc::push_return::<IERC721Metadata::nameCall>(&asserter, &"Monad Punks".to_string());
        rpc::push_return::<IERC721Metadata::symbolCall>(&asserter, &"MPUNK".to_string());

        let info = detect(&rpc::mocked_provider(&asserter), TOKEN).await.unwrap();
        assert_eq!(info, nft().unwrap());
    }

    #[tokio::test]
    async fn test_detect_erc1155_without_metadata() {
        let asserter = Asserter::new();
        rpc::push_code(&asserter, CODE);
        rpc::push_revert(&asserter);
        // Not ERC-721, so its metadata is never read
        rpc::push_return::<IERC165::supportsInterfaceCall>(&asserter, &false);
        rpc::push_return::<IERC165::supportsInterfaceCall>(&asserter, &true);
        rpc::push_revert(&asserter);
        rpc::push_revert(&asserter);

        let info = detect(&rpc::mocked_provider(&asserter), TOKEN).await.unwrap();
        assert_eq!(info, TokenInfo::Erc1155 { name: None, symbol: None });
        assert!(asserter.read_q().is_empty());
    }

    #[tokio::test]
    async fn test_detect_unknown_contract() {
        let asserter = Asserter::new();
        rpc::push_code(&asserter, CODE);
        rpc::push_revert(&asserter);
        rpc::push_return::<IERC165::supportsInterfaceCall>(&asserter, &false);
        rpc::push_return::<IERC165::supportsInterfaceCall>(&asserter, &false);

        let info = detect(&rpc::mocked_provider(&asserter), TOKEN).await.unwrap();
        assert_eq!(info, TokenInfo::Unknown);
        assert_eq!(info.standard().to_string(), "unknown");
        assert!(asserter.read_q().is_empty());
    }
}
