use crate::{
    error::WalletError,
    frame::{
        FrameHost,
        ReadyOptions,
        SendTokenOutcome,
        SendTokenRequest,
    },
    provider::{
        TransactionReceipt,
        TransactionRequest,
        WalletProvider,
    },
};
use alloy_primitives::{
    Address,
    B256,
    U256,
};
use std::{
    sync::{
        Arc,
        Mutex,
    },
    time::Duration,
};

#[derive(Debug)]
struct WalletState {
    accounts: Vec<Address>,
    chain_id: u64,
    balance: U256,
    balance_calls: usize,
    read_error: Option<WalletError>,
    send_response: Result<B256, WalletError>,
    sent: Vec<TransactionRequest>,
    receipt: Option<TransactionReceipt>,
    receipt_calls: usize,
}

/// In-memory wallet whose observable state can be changed between calls.
#[derive(Clone, Debug)]
pub struct FakeWallet {
    state: Arc<Mutex<WalletState>>,
}

impl FakeWallet {
    pub fn connected(address: Address, chain_id: u64, balance: U256) -> Self {
        Self::with_accounts(vec![address], chain_id, balance)
    }

    /// No account authorized.
    pub fn locked(chain_id: u64) -> Self {
        Self::with_accounts(Vec::new(), chain_id, U256::ZERO)
    }

    fn with_accounts(accounts: Vec<Address>, chain_id: u64, balance: U256) -> Self {
        let state = WalletState {
            accounts,
            chain_id,
            balance,
            balance_calls: 0,
            read_error: None,
            send_response: Ok(B256::repeat_byte(0x01)),
            sent: Vec::new(),
            receipt: None,
            receipt_calls: 0,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.lock().unwrap().accounts = accounts;
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.state.lock().unwrap().chain_id = chain_id;
    }

    pub fn set_balance(&self, balance: U256) {
        self.state.lock().unwrap().balance = balance;
    }

    /// Makes every read fail until cleared with `None`.
    pub fn fail_reads_with(&self, err: Option<WalletError>) {
        self.state.lock().unwrap().read_error = err;
    }

    pub fn respond_with_hash(&self, hash: B256) {
        self.state.lock().unwrap().send_response = Ok(hash);
    }

    pub fn reject_send_with(&self, err: WalletError) {
        self.state.lock().unwrap().send_response = Err(err);
    }

    pub fn set_receipt(&self, receipt: Option<TransactionReceipt>) {
        self.state.lock().unwrap().receipt = receipt;
    }

    pub fn balance_calls(&self) -> usize {
        self.state.lock().unwrap().balance_calls
    }

    pub fn receipt_calls(&self) -> usize {
        self.state.lock().unwrap().receipt_calls
    }

    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    fn check_reads(state: &WalletState) -> Result<(), WalletError> {
        match &state.read_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl WalletProvider for FakeWallet {
    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        let state = self.state.lock().unwrap();
        Self::check_reads(&state)?;
        Ok(state.accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        let state = self.state.lock().unwrap();
        Self::check_reads(&state)?;
        Ok(state.chain_id)
    }

    async fn balance(&self, _address: Address) -> Result<U256, WalletError> {
        let mut state = self.state.lock().unwrap();
        Self::check_reads(&state)?;
        state.balance_calls += 1;
        Ok(state.balance)
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, WalletError> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(tx.clone());
        state.send_response.clone()
    }

    async fn transaction_receipt(
        &self,
        _hash: B256,
    ) -> Result<Option<TransactionReceipt>, WalletError> {
        let mut state = self.state.lock().unwrap();
        state.receipt_calls += 1;
        Ok(state.receipt.clone())
    }
}

#[derive(Debug)]
struct HostState {
    in_mini_app: bool,
    provider_url: Option<String>,
    ready_delay: Duration,
    ready_error: Option<WalletError>,
    ready_calls: usize,
    add_calls: usize,
    send_response: SendTokenOutcome,
    send_requests: Vec<SendTokenRequest>,
}

/// In-memory Mini App host.
#[derive(Clone, Debug)]
pub struct FakeFrameHost {
    state: Arc<Mutex<HostState>>,
}

impl Default for FakeFrameHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeFrameHost {
    pub fn new() -> Self {
        let state = HostState {
            in_mini_app: true,
            provider_url: None,
            ready_delay: Duration::ZERO,
            ready_error: None,
            ready_calls: 0,
            add_calls: 0,
            send_response: SendTokenOutcome::Sent {
                transaction: B256::repeat_byte(0x02),
            },
            send_requests: Vec::new(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn standalone() -> Self {
        let host = Self::new();
        host.state.lock().unwrap().in_mini_app = false;
        host
    }

    pub fn set_provider_url(&self, url: Option<String>) {
        self.state.lock().unwrap().provider_url = url;
    }

    pub fn delay_ready_by(&self, delay: Duration) {
        self.state.lock().unwrap().ready_delay = delay;
    }

    pub fn fail_ready_with(&self, err: WalletError) {
        self.state.lock().unwrap().ready_error = Some(err);
    }

    pub fn respond_with(&self, outcome: SendTokenOutcome) {
        self.state.lock().unwrap().send_response = outcome;
    }

    pub fn ready_calls(&self) -> usize {
        self.state.lock().unwrap().ready_calls
    }

    pub fn add_calls(&self) -> usize {
        self.state.lock().unwrap().add_calls
    }

    pub fn send_requests(&self) -> Vec<SendTokenRequest> {
        self.state.lock().unwrap().send_requests.clone()
    }
}

impl FrameHost for FakeFrameHost {
    async fn is_in_mini_app(&self) -> Result<bool, WalletError> {
        Ok(self.state.lock().unwrap().in_mini_app)
    }

    async fn ready(&self, _options: ReadyOptions) -> Result<(), WalletError> {
        let (delay, error) = {
            let mut state = self.state.lock().unwrap();
            state.ready_calls += 1;
            (state.ready_delay, state.ready_error.clone())
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn add_mini_app(&self) -> Result<(), WalletError> {
        self.state.lock().unwrap().add_calls += 1;
        Ok(())
    }

    async fn ethereum_provider_url(&self) -> Result<Option<String>, WalletError> {
        Ok(self.state.lock().unwrap().provider_url.clone())
    }

    async fn send_token(
        &self,
        request: &SendTokenRequest,
    ) -> Result<SendTokenOutcome, WalletError> {
        let mut state = self.state.lock().unwrap();
        state.send_requests.push(request.clone());
        Ok(state.send_response.clone())
    }
}
