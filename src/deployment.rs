use crate::{
    constants::{
        DEPLOYER_ADDRESS,
        DEPLOYMENT_FEE_WEI,
        EXPLORER_TX_URL,
        PENDING_ADDRESS_LABEL,
        PREDEFINED_BYTECODE,
    },
    error::WalletError,
    frame::{
        FrameHost,
        SendTokenRequest,
    },
    provider::{
        TransactionReceipt,
        TransactionRequest,
        WalletProvider,
    },
    wallet::WalletContext,
};
use alloy_primitives::{
    Address,
    B256,
    Bytes,
    U256,
};
use alloy_sol_types::{
    SolCall,
    sol,
};
use chrono::{
    DateTime,
    Utc,
};
use std::fmt;
use tracing::{
    info,
    warn,
};

sol! {
    function deployContract(bytes bytecode) external payable returns (address);
}

pub fn predefined_bytecode() -> Result<Bytes, hex::FromHexError> {
    let raw = PREDEFINED_BYTECODE
        .strip_prefix("0x")
        .unwrap_or(PREDEFINED_BYTECODE);
    hex::decode(raw).map(Bytes::from)
}

/// The single unit of work the app submits: a paid call into the factory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub target: Address,
    pub value: U256,
    pub payload: Bytes,
}

impl DeploymentRequest {
    /// `deployContract(bytecode)` on the factory, paying the fixed fee.
    pub fn hyperploy() -> Result<Self, hex::FromHexError> {
        let call = deployContractCall {
            bytecode: predefined_bytecode()?,
        };
        Ok(Self {
            target: DEPLOYER_ADDRESS,
            value: DEPLOYMENT_FEE_WEI,
            payload: Bytes::from(call.abi_encode()),
        })
    }

    pub fn transaction(&self, from: Address) -> TransactionRequest {
        TransactionRequest {
            from,
            to: self.target,
            value: self.value,
            data: self.payload.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub block_number: Option<u64>,
    pub succeeded: bool,
}

/// Outcome of one submission attempt. Replaced wholesale by the next one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentResult {
    pub transaction_hash: Option<B256>,
    pub deployed_address: Option<String>,
    pub error_message: Option<String>,
    pub is_pending: bool,
    pub submitted_at: DateTime<Utc>,
    pub confirmation: Option<Confirmation>,
}

impl DeploymentResult {
    pub fn pending() -> Self {
        Self {
            transaction_hash: None,
            deployed_address: None,
            error_message: None,
            is_pending: true,
            submitted_at: Utc::now(),
            confirmation: None,
        }
    }

    pub fn succeeded(hash: B256) -> Self {
        Self {
            transaction_hash: Some(hash),
            deployed_address: Some(String::from(PENDING_ADDRESS_LABEL)),
            error_message: None,
            is_pending: false,
            submitted_at: Utc::now(),
            confirmation: None,
        }
    }

    pub fn failed(err: &WalletError) -> Self {
        Self {
            transaction_hash: None,
            deployed_address: None,
            error_message: Some(err.user_message()),
            is_pending: false,
            submitted_at: Utc::now(),
            confirmation: None,
        }
    }

    pub fn is_success(&self) -> bool {
        !self.is_pending && self.transaction_hash.is_some()
    }

    pub fn is_failure(&self) -> bool {
        !self.is_pending && self.error_message.is_some()
    }

    /// `0x` plus eight hex digits, an ellipsis, and the last eight digits.
    pub fn short_hash(&self) -> Option<String> {
        self.transaction_hash.map(|hash| shorten(&hash.to_string()))
    }

    pub fn explorer_url(&self) -> Option<String> {
        self.transaction_hash
            .map(|hash| format!("{EXPLORER_TX_URL}{hash}"))
    }

    pub fn apply_receipt(&mut self, receipt: &TransactionReceipt) {
        if let Some(address) = receipt.contract_address {
            self.deployed_address = Some(address.to_string());
        }
        self.confirmation = Some(Confirmation {
            block_number: receipt.block_number.map(|n| n.to::<u64>()),
            succeeded: receipt.succeeded(),
        });
    }
}

pub fn shorten(hash: &str) -> String {
    if hash.len() <= 18 {
        return hash.to_string();
    }
    format!("{}...{}", &hash[..10], &hash[hash.len() - 8..])
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SubmitStrategy {
    /// `eth_sendTransaction` carrying the factory calldata.
    #[default]
    RawTransaction,
    /// The host's send-token action; transfers the fee only.
    TokenSend,
}

impl fmt::Display for SubmitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmitStrategy::RawTransaction => "raw transaction",
            SubmitStrategy::TokenSend => "token send",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeploymentSubmitter {
    strategy: SubmitStrategy,
}

impl DeploymentSubmitter {
    pub fn new(strategy: SubmitStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> SubmitStrategy {
        self.strategy
    }

    /// Signs and broadcasts `request`. Never fails: every error is folded into
    /// the returned result.
    pub async fn submit<P: WalletProvider, H: FrameHost>(
        &self,
        ctx: &WalletContext<P, H>,
        from: Address,
        request: &DeploymentRequest,
    ) -> DeploymentResult {
        info!(strategy = %self.strategy, %from, to = %request.target, "submitting deployment");
        match self.send(ctx, from, request).await {
            Ok(hash) => {
                info!(%hash, "deployment transaction submitted");
                DeploymentResult::succeeded(hash)
            }
            Err(err) => {
                warn!(error = %err, "deployment submission failed");
                DeploymentResult::failed(&err)
            }
        }
    }

    async fn send<P: WalletProvider, H: FrameHost>(
        &self,
        ctx: &WalletContext<P, H>,
        from: Address,
        request: &DeploymentRequest,
    ) -> Result<B256, WalletError> {
        match self.strategy {
            SubmitStrategy::RawTransaction => {
                let provider = ctx.provider()?;
                provider.send_transaction(&request.transaction(from)).await
            }
            SubmitStrategy::TokenSend => {
                let host = ctx.host()?;
                let send = SendTokenRequest::native(request.value, request.target);
                host.send_token(&send).await?.into_result()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::test_helpers::{
        FakeFrameHost,
        FakeWallet,
    };
    use alloy_primitives::{
        address,
        b256,
        keccak256,
    };

    const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");

    #[test]
    fn hyperploy__payload_is_deploy_contract_call() {
        let request = DeploymentRequest::hyperploy().unwrap();

        let selector = keccak256("deployContract(bytes)");
        assert_eq!(&selector[..4], &request.payload[..4]);
        assert_eq!(DEPLOYMENT_FEE_WEI, request.value);
        assert_eq!(DEPLOYER_ADDRESS, request.target);
    }

    #[test]
    fn hyperploy__payload_round_trips_bytecode() {
        let request = DeploymentRequest::hyperploy().unwrap();

        let decoded = deployContractCall::abi_decode(&request.payload).unwrap();

        assert_eq!(predefined_bytecode().unwrap(), decoded.bytecode);
    }

    #[test]
    fn short_hash__keeps_prefix_and_suffix() {
        let hash = b256!("0xdead00000000000000000000000000000000000000000000000000000000beef");
        let result = DeploymentResult::succeeded(hash);

        assert_eq!(Some(String::from("0xdead0000...0000beef")), result.short_hash());
        assert_eq!(Some(String::from(PENDING_ADDRESS_LABEL)), result.deployed_address);
    }

    #[test]
    fn failed__sets_message_and_clears_pending() {
        let result = DeploymentResult::failed(&WalletError::UserRejected {
            message: Some(String::from("User rejected")),
        });

        assert!(!result.is_pending);
        assert!(result.transaction_hash.is_none());
        assert_eq!(Some(String::from("User rejected")), result.error_message);
    }

    #[tokio::test]
    async fn submit__raw_transaction_sends_fee_and_calldata() {
        // given
        let hash = B256::repeat_byte(0x11);
        let wallet = FakeWallet::connected(ALICE, 12121, DEPLOYMENT_FEE_WEI);
        wallet.respond_with_hash(hash);
        let ctx = WalletContext::<_, FakeFrameHost>::injected(wallet.clone());
        let request = DeploymentRequest::hyperploy().unwrap();
        let sut = DeploymentSubmitter::new(SubmitStrategy::RawTransaction);

        // when
        let result = sut.submit(&ctx, ALICE, &request).await;

        // then
        assert_eq!(Some(hash), result.transaction_hash);
        assert_eq!(vec![request.transaction(ALICE)], wallet.sent_transactions());
    }

    #[tokio::test]
    async fn submit__token_send_without_host__then_provider_unavailable() {
        let wallet = FakeWallet::connected(ALICE, 12121, DEPLOYMENT_FEE_WEI);
        let ctx = WalletContext::<_, FakeFrameHost>::injected(wallet);
        let request = DeploymentRequest::hyperploy().unwrap();
        let sut = DeploymentSubmitter::new(SubmitStrategy::TokenSend);

        let result = sut.submit(&ctx, ALICE, &request).await;

        assert_eq!(
            Some(WalletError::ProviderUnavailable.user_message()),
            result.error_message
        );
    }

    #[tokio::test]
    async fn submit__token_send_transfers_fee_to_factory() {
        let host = FakeFrameHost::new();
        host.respond_with(crate::frame::SendTokenOutcome::Sent {
            transaction: B256::repeat_byte(0x22),
        });
        let ctx = WalletContext::<FakeWallet, _>::new(None, Some(host.clone()));
        let request = DeploymentRequest::hyperploy().unwrap();
        let sut = DeploymentSubmitter::new(SubmitStrategy::TokenSend);

        let result = sut.submit(&ctx, ALICE, &request).await;

        assert_eq!(Some(B256::repeat_byte(0x22)), result.transaction_hash);
        assert_eq!(
            vec![SendTokenRequest::native(DEPLOYMENT_FEE_WEI, DEPLOYER_ADDRESS)],
            host.send_requests()
        );
    }

    #[test]
    fn apply_receipt__contract_address_replaces_pending_label() {
        let mut result = DeploymentResult::succeeded(B256::ZERO);
        let created = address!("0x00000000000000000000000000000000c0ffee00");
        result.apply_receipt(&TransactionReceipt {
            transaction_hash: B256::ZERO,
            block_number: Some(alloy_primitives::U64::from(42)),
            status: Some(alloy_primitives::U64::from(1)),
            contract_address: Some(created),
        });

        assert_eq!(Some(created.to_string()), result.deployed_address);
        assert_eq!(
            Some(Confirmation {
                block_number: Some(42),
                succeeded: true
            }),
            result.confirmation
        );
    }
}
