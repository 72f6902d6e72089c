use crate::error::WalletError;
use alloy_primitives::{
    Address,
    B256,
    Bytes,
    U64,
    U256,
};
use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    info,
};

/// Transaction handed to the wallet for signing and broadcast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub contract_address: Option<Address>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.is_none_or(|s| s == U64::from(1))
    }
}

/// Account, network and submission operations exposed by a wallet.
///
/// The wallet is owned by its host; any value read through it may change
/// between two calls.
pub trait WalletProvider {
    fn accounts(&self) -> impl Future<Output = Result<Vec<Address>, WalletError>>;

    fn chain_id(&self) -> impl Future<Output = Result<u64, WalletError>>;

    fn balance(&self, address: Address) -> impl Future<Output = Result<U256, WalletError>>;

    fn send_transaction(
        &self,
        tx: &TransactionRequest,
    ) -> impl Future<Output = Result<B256, WalletError>>;

    fn transaction_receipt(
        &self,
        hash: B256,
    ) -> impl Future<Output = Result<Option<TransactionReceipt>, WalletError>>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// Turns the wallet's observable account and chain into change notifications.
///
/// HTTP wallets have no push channel, so the watcher is polled on a fixed
/// cadence and reports differences from the previous observation.
#[derive(Debug, Default)]
pub struct WalletWatcher {
    last_accounts: Option<Vec<Address>>,
    last_chain_id: Option<u64>,
}

impl WalletWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn poll<P: WalletProvider>(
        &mut self,
        provider: &P,
    ) -> Result<Vec<WalletEvent>, WalletError> {
        let accounts = provider.accounts().await?;
        let chain_id = provider.chain_id().await?;
        let mut events = Vec::new();

        match &self.last_accounts {
            Some(prev) if *prev != accounts => {
                info!(?accounts, "wallet accounts changed");
                events.push(WalletEvent::AccountsChanged(accounts.clone()));
            }
            _ => {}
        }
        match self.last_chain_id {
            Some(prev) if prev != chain_id => {
                info!(from = prev, to = chain_id, "wallet chain changed");
                events.push(WalletEvent::ChainChanged(chain_id));
            }
            _ => {}
        }
        if events.is_empty() {
            debug!("wallet unchanged");
        }

        self.last_accounts = Some(accounts);
        self.last_chain_id = Some(chain_id);
        Ok(events)
    }

    /// Forgets the previous observation, e.g. after a full reload.
    pub fn reset(&mut self) {
        self.last_accounts = None;
        self.last_chain_id = None;
    }
}
