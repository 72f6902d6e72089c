use crate::{
    error::WalletError,
    network,
    provider::WalletProvider,
    units::format_native,
};
use alloy_primitives::{
    Address,
    U256,
};
use chrono::{
    DateTime,
    Utc,
};
use tracing::info;

/// The wallet capabilities available to the app, passed in explicitly.
///
/// `provider` is the signing endpoint; `host` is the embedding Mini App host,
/// present only when the app runs inside one.
#[derive(Clone, Debug)]
pub struct WalletContext<P, H> {
    pub provider: Option<P>,
    pub host: Option<H>,
}

impl<P, H> WalletContext<P, H> {
    pub fn new(provider: Option<P>, host: Option<H>) -> Self {
        Self { provider, host }
    }

    pub fn injected(provider: P) -> Self {
        Self::new(Some(provider), None)
    }

    pub fn empty() -> Self {
        Self::new(None, None)
    }

    pub fn provider(&self) -> Result<&P, WalletError> {
        match (&self.provider, &self.host) {
            (Some(provider), _) => Ok(provider),
            (None, Some(_)) => Err(WalletError::ProviderUnavailable),
            (None, None) => Err(WalletError::NoProvider),
        }
    }

    pub fn host(&self) -> Result<&H, WalletError> {
        match (&self.host, &self.provider) {
            (Some(host), _) => Ok(host),
            (None, Some(_)) => Err(WalletError::ProviderUnavailable),
            (None, None) => Err(WalletError::NoProvider),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletSnapshot {
    /// Absent when no account is authorized.
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    pub balance: U256,
    pub observed_at: DateTime<Utc>,
}

impl WalletSnapshot {
    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub fn is_correct_network(&self) -> bool {
        network::is_correct(self.chain_id)
    }

    pub fn balance_display(&self) -> String {
        format_native(self.balance)
    }
}

/// Reads the connected account, chain and balance.
///
/// Safe to call repeatedly; nothing is cached between calls.
pub async fn probe<P: WalletProvider, H>(
    ctx: &WalletContext<P, H>,
) -> Result<WalletSnapshot, WalletError> {
    let provider = ctx.provider()?;
    let accounts = provider.accounts().await?;
    let address = accounts.first().copied();
    let chain_id = provider.chain_id().await?;
    let balance = match address {
        Some(address) => provider.balance(address).await?,
        None => U256::ZERO,
    };
    info!(
        address = ?address,
        chain_id,
        balance = %format_native(balance),
        "wallet probed"
    );
    Ok(WalletSnapshot {
        address,
        chain_id: Some(chain_id),
        balance,
        observed_at: Utc::now(),
    })
}
