use crate::{
    constants::{
        NATIVE_SYMBOL,
        REQUIRED_CHAIN_ID,
    },
    deployment::{
        DeploymentRequest,
        DeploymentResult,
        DeploymentSubmitter,
        SubmitStrategy,
    },
    error::WalletError,
    frame::FrameHost,
    network::NetworkCheck,
    provider::{
        WalletEvent,
        WalletProvider,
        WalletWatcher,
    },
    units::format_native,
    wallet::{
        self,
        WalletContext,
        WalletSnapshot,
    },
};
use alloy_primitives::{
    Address,
    U256,
};
use tracing::{
    debug,
    info,
    warn,
};

/// Verdict of the submit gate for the current wallet observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    Disconnected,
    WrongNetwork,
    InsufficientBalance,
    Ready,
}

impl Readiness {
    pub fn evaluate(snapshot: Option<&WalletSnapshot>, fee: U256) -> Self {
        let Some(snapshot) = snapshot.filter(|s| s.is_connected()) else {
            return Readiness::Disconnected;
        };
        if !snapshot.is_correct_network() {
            Readiness::WrongNetwork
        } else if snapshot.balance < fee {
            Readiness::InsufficientBalance
        } else {
            Readiness::Ready
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowState {
    Disconnected,
    WrongNetwork,
    Ready,
    /// Connected on the right network but short of the fee.
    Blocked,
    Submitting,
    Succeeded,
    Failed,
}

/// Deploy-screen state machine: probe, gate, submit, display.
#[derive(Debug)]
pub struct DeployFlowController<P, H> {
    ctx: WalletContext<P, H>,
    submitter: DeploymentSubmitter,
    request: DeploymentRequest,
    snapshot: Option<WalletSnapshot>,
    probe_error: Option<WalletError>,
    result: Option<DeploymentResult>,
    watcher: WalletWatcher,
}

impl<P: WalletProvider, H: FrameHost> DeployFlowController<P, H> {
    pub fn new(
        ctx: WalletContext<P, H>,
        strategy: SubmitStrategy,
    ) -> Result<Self, hex::FromHexError> {
        Ok(Self::with_request(
            ctx,
            DeploymentSubmitter::new(strategy),
            DeploymentRequest::hyperploy()?,
        ))
    }

    pub fn with_request(
        ctx: WalletContext<P, H>,
        submitter: DeploymentSubmitter,
        request: DeploymentRequest,
    ) -> Self {
        Self {
            ctx,
            submitter,
            request,
            snapshot: None,
            probe_error: None,
            result: None,
            watcher: WalletWatcher::new(),
        }
    }

    pub fn snapshot(&self) -> Option<&WalletSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn result(&self) -> Option<&DeploymentResult> {
        self.result.as_ref()
    }

    pub fn request(&self) -> &DeploymentRequest {
        &self.request
    }

    pub fn strategy(&self) -> SubmitStrategy {
        self.submitter.strategy()
    }

    pub fn network_check(&self) -> NetworkCheck {
        NetworkCheck::from_chain_id(self.snapshot.as_ref().and_then(|s| s.chain_id))
    }

    /// Re-reads the wallet. A failed probe drops the previous snapshot so the
    /// gate never runs on stale data.
    pub async fn refresh(&mut self) -> Result<(), WalletError> {
        match wallet::probe(&self.ctx).await {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.probe_error = None;
                debug!(readiness = ?self.readiness(), "wallet refreshed");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "wallet probe failed");
                self.snapshot = None;
                self.probe_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Drops everything derived from the previous chain and probes again.
    pub async fn reload(&mut self) -> Result<(), WalletError> {
        info!("reloading wallet state");
        self.result = None;
        self.snapshot = None;
        self.probe_error = None;
        self.watcher.reset();
        self.refresh().await
    }

    pub async fn handle_event(&mut self, event: WalletEvent) -> Result<(), WalletError> {
        match event {
            WalletEvent::AccountsChanged(_) => {
                let previous = self.snapshot.as_ref().and_then(|s| s.address);
                let refreshed = self.refresh().await;
                let current = self.snapshot.as_ref().and_then(|s| s.address);
                if current != previous || self.readiness() != Readiness::Ready {
                    self.drop_settled_result();
                }
                refreshed
            }
            WalletEvent::ChainChanged(_) => self.reload().await,
        }
    }

    /// A finished attempt belongs to the account that made it.
    fn drop_settled_result(&mut self) {
        if self.result.as_ref().is_some_and(|r| !r.is_pending) {
            debug!("discarding result of previous account");
            self.result = None;
        }
    }

    /// Polls the wallet for account or chain changes and reacts to them.
    pub async fn watch(&mut self) -> Result<(), WalletError> {
        let Ok(provider) = self.ctx.provider() else {
            return Ok(());
        };
        let events = self.watcher.poll(provider).await?;
        for event in events {
            self.handle_event(event).await?;
        }
        Ok(())
    }

    pub fn readiness(&self) -> Readiness {
        Readiness::evaluate(self.snapshot.as_ref(), self.request.value)
    }

    pub fn state(&self) -> FlowState {
        if let Some(result) = &self.result {
            if result.is_pending {
                return FlowState::Submitting;
            }
            if result.is_success() {
                return FlowState::Succeeded;
            }
            if result.is_failure() {
                return FlowState::Failed;
            }
        }
        match self.readiness() {
            Readiness::Disconnected => FlowState::Disconnected,
            Readiness::WrongNetwork => FlowState::WrongNetwork,
            Readiness::InsufficientBalance => FlowState::Blocked,
            Readiness::Ready => FlowState::Ready,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.is_pending)
    }

    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && self.readiness() == Readiness::Ready
    }

    /// Why the submit trigger is inert, if it is.
    pub fn blocker(&self) -> Option<WalletError> {
        if let Some(err) = &self.probe_error {
            return Some(err.clone());
        }
        let snapshot = self.snapshot.as_ref();
        match self.readiness() {
            Readiness::Ready => None,
            Readiness::Disconnected => Some(WalletError::NotConnected),
            Readiness::WrongNetwork => Some(WalletError::WrongNetwork {
                expected: REQUIRED_CHAIN_ID,
                actual: snapshot.and_then(|s| s.chain_id),
            }),
            Readiness::InsufficientBalance => Some(WalletError::InsufficientBalance {
                required: self.request.value,
                available: snapshot.map(|s| s.balance).unwrap_or(U256::ZERO),
            }),
        }
    }

    /// Notices shown above the submit action. Several can apply at once.
    pub fn warnings(&self) -> Vec<String> {
        if let Some(err) = &self.probe_error {
            return vec![err.user_message()];
        }
        let Some(snapshot) = self.snapshot.as_ref().filter(|s| s.is_connected()) else {
            return vec![String::from("Please connect your wallet to deploy.")];
        };
        let mut warnings = Vec::new();
        if !snapshot.is_correct_network() {
            warnings.push(format!(
                "Please switch to HyperEVM network (Chain ID: {REQUIRED_CHAIN_ID})"
            ));
        }
        if snapshot.balance < self.request.value {
            warnings.push(format!(
                "Insufficient balance. You need at least {} {NATIVE_SYMBOL} to deploy.",
                format_native(self.request.value)
            ));
        }
        warnings
    }

    /// Enters `Submitting` when the gate allows it, clearing the previous
    /// attempt. Returns the sending account, or `None` if the click is inert.
    pub fn begin_submit(&mut self) -> Option<Address> {
        if !self.can_submit() {
            debug!(state = ?self.state(), "submit ignored");
            return None;
        }
        let from = self.snapshot.as_ref()?.address?;
        self.result = Some(DeploymentResult::pending());
        Some(from)
    }

    pub async fn complete_submit(&mut self, from: Address) -> &DeploymentResult {
        let result = self.submitter.submit(&self.ctx, from, &self.request).await;
        self.result.insert(result)
    }

    /// Re-validates the wallet, then runs one full submission if allowed.
    pub async fn submit(&mut self) -> FlowState {
        if self.is_submitting() {
            return FlowState::Submitting;
        }
        if let Err(err) = self.refresh().await {
            debug!(error = %err, "submit blocked by probe failure");
        }
        if let Some(from) = self.begin_submit() {
            self.complete_submit(from).await;
        }
        self.state()
    }

    /// Checks once whether the last successful submission has been mined.
    pub async fn poll_confirmation(&mut self) {
        let Some(result) = self.result.as_mut() else {
            return;
        };
        let Some(hash) = result.transaction_hash else {
            return;
        };
        if result.confirmation.is_some() {
            return;
        }
        let Ok(provider) = self.ctx.provider() else {
            return;
        };
        match provider.transaction_receipt(hash).await {
            Ok(Some(receipt)) => {
                info!(%hash, succeeded = receipt.succeeded(), "deployment confirmed");
                result.apply_receipt(&receipt);
            }
            Ok(None) => debug!(%hash, "deployment not mined yet"),
            Err(err) => warn!(%hash, error = %err, "receipt lookup failed"),
        }
    }

    /// Hands over the last result when leaving the deploy screen.
    pub fn discard_result(&mut self) -> Option<DeploymentResult> {
        self.result.take()
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::{
        constants::DEPLOYMENT_FEE_WEI,
        test_helpers::{
            FakeFrameHost,
            FakeWallet,
        },
    };
    use alloy_primitives::address;
    use chrono::Utc;

    const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");

    fn snapshot(address: Option<Address>, chain_id: u64, balance: U256) -> WalletSnapshot {
        WalletSnapshot {
            address,
            chain_id: Some(chain_id),
            balance,
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn evaluate__when_no_snapshot__then_disconnected() {
        assert_eq!(
            Readiness::Disconnected,
            Readiness::evaluate(None, DEPLOYMENT_FEE_WEI)
        );
    }

    #[test]
    fn evaluate__checks_network_before_balance() {
        let snap = snapshot(Some(ALICE), 1, U256::ZERO);
        assert_eq!(
            Readiness::WrongNetwork,
            Readiness::evaluate(Some(&snap), DEPLOYMENT_FEE_WEI)
        );
    }

    #[test]
    fn evaluate__when_balance_equals_fee__then_ready() {
        let snap = snapshot(Some(ALICE), 12121, DEPLOYMENT_FEE_WEI);
        assert_eq!(
            Readiness::Ready,
            Readiness::evaluate(Some(&snap), DEPLOYMENT_FEE_WEI)
        );
    }

    #[tokio::test]
    async fn begin_submit__when_already_submitting__then_inert() {
        // given
        let wallet = FakeWallet::connected(ALICE, 12121, DEPLOYMENT_FEE_WEI);
        let mut sut = DeployFlowController::<_, FakeFrameHost>::new(
            WalletContext::injected(wallet.clone()),
            SubmitStrategy::RawTransaction,
        )
        .unwrap();
        sut.refresh().await.unwrap();
        assert_eq!(Some(ALICE), sut.begin_submit());

        // when
        let second = sut.begin_submit();

        // then
        assert_eq!(None, second);
        assert_eq!(FlowState::Submitting, sut.state());
        assert!(wallet.sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn blocker__when_probe_failed__then_reports_probe_error() {
        let mut sut = DeployFlowController::<FakeWallet, FakeFrameHost>::new(
            WalletContext::empty(),
            SubmitStrategy::RawTransaction,
        )
        .unwrap();

        let _ = sut.refresh().await;

        assert_eq!(Some(WalletError::NoProvider), sut.blocker());
        assert_eq!(FlowState::Disconnected, sut.state());
    }
}
