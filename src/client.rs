use crate::ui;
use alloy_primitives::{
    Address,
    U256,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use futures::StreamExt;
use hyperploy::{
    DeployFlowController,
    DeploymentResult,
    FlowState,
    SubmitStrategy,
    WalletContext,
    WalletSnapshot,
    bootstrap,
    frame::{
        FrameHost,
        HttpFrameHost,
    },
    network::NetworkCheck,
    provider::WalletProvider,
    rpc::RpcWallet,
};
use std::{
    path::Path,
    time::Duration,
};
use tokio::time;
use tracing::{
    error,
    info,
    warn,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const MAX_ERRORS: usize = 50;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Wallet JSON-RPC endpoint; overrides the one offered by the host.
    pub rpc_url: Option<String>,
    /// Base URL of the Mini App host bridge.
    pub frame_host: Option<String>,
    pub strategy: SubmitStrategy,
    pub poll_interval: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Deploy,
    /// Confirmation for the last successful deployment.
    Success(DeploymentResult),
}

#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub screen: Screen,
    pub wallet: Option<WalletSnapshot>,
    pub network: NetworkCheck,
    pub state: FlowState,
    pub can_submit: bool,
    pub strategy: SubmitStrategy,
    /// Fee the deployment pays, in wei.
    pub fee: U256,
    pub warnings: Vec<String>,
    pub result: Option<DeploymentResult>,
    pub status: String,
    pub errors: Vec<String>,
}

pub struct AppController<P, H> {
    flow: DeployFlowController<P, H>,
    screen: Screen,
    status: String,
    errors: Vec<String>,
}

impl<P: WalletProvider, H: FrameHost> AppController<P, H> {
    pub fn new(flow: DeployFlowController<P, H>) -> Self {
        Self {
            flow,
            screen: Screen::Landing,
            status: String::from("Welcome"),
            errors: Vec::new(),
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            screen: self.screen.clone(),
            wallet: self.flow.snapshot().cloned(),
            network: self.flow.network_check(),
            state: self.flow.state(),
            can_submit: self.flow.can_submit(),
            strategy: self.flow.strategy(),
            fee: self.flow.request().value,
            warnings: self.flow.warnings(),
            result: self.flow.result().cloned(),
            status: self.status.clone(),
            errors: self.errors.iter().rev().take(5).cloned().collect(),
        }
    }

    pub async fn open_deploy(&mut self) {
        self.screen = Screen::Deploy;
        self.status = String::from("Checking wallet...");
        self.refresh().await;
    }

    pub async fn refresh(&mut self) {
        match self.flow.refresh().await {
            Ok(()) => self.status = format!("{:?}", self.flow.state()),
            Err(err) => self.status = err.user_message(),
        }
    }

    /// Leaves the deploy screen; the last result does not survive it.
    pub fn back_to_landing(&mut self) {
        self.flow.discard_result();
        self.screen = Screen::Landing;
        self.status = String::from("Welcome");
    }

    pub fn view_success(&mut self) {
        if self.screen != Screen::Deploy || self.flow.state() != FlowState::Succeeded {
            return;
        }
        if let Some(result) = self.flow.discard_result() {
            self.screen = Screen::Success(result);
            self.status = String::from("Deployment submitted");
        }
    }

    /// First half of a submission: re-probe and gate. Returns whether the
    /// wallet should now be asked to sign.
    pub async fn prepare_submit(&mut self) -> Option<Address> {
        if self.screen != Screen::Deploy {
            return None;
        }
        if let Err(err) = self.flow.refresh().await {
            self.status = err.user_message();
        }
        let from = self.flow.begin_submit();
        if from.is_some() {
            self.status = String::from("Deploying...");
        } else if let Some(blocker) = self.flow.blocker() {
            self.status = blocker.user_message();
            if !blocker.is_policy() {
                self.push_errors(vec![blocker.user_message()]);
            }
        }
        from
    }

    pub async fn finish_submit(&mut self, from: Address) {
        let result = self.flow.complete_submit(from).await;
        match &result.error_message {
            Some(message) => {
                let message = message.clone();
                self.status = String::from("Deployment failed");
                self.push_errors(vec![message]);
            }
            None => {
                self.status = match result.short_hash() {
                    Some(hash) => format!("Submitted {hash}"),
                    None => String::from("Submitted"),
                };
            }
        }
    }

    /// Periodic work on the deploy screen: wallet changes and confirmations.
    pub async fn tick(&mut self) {
        if self.screen != Screen::Deploy || self.flow.is_submitting() {
            return;
        }
        if let Err(err) = self.flow.watch().await {
            warn!(error = %err, "wallet watch failed");
            self.status = err.user_message();
        }
        self.flow.poll_confirmation().await;
    }

    fn push_errors(&mut self, mut items: Vec<String>) {
        if items.is_empty() {
            return;
        }
        for item in &items {
            error!("{}", item);
        }
        self.errors.append(&mut items);
        if self.errors.len() > MAX_ERRORS {
            let drain = self.errors.len() - MAX_ERRORS;
            self.errors.drain(0..drain);
        }
    }
}

/// Routes logs to a daily file; the terminal belongs to the UI.
pub fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    let appender = tracing_appender::rolling::daily(log_dir, "hyperploy.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hyperploy=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| eyre!("failed to install tracing subscriber: {e}"))?;
    Ok(guard)
}

/// Picks the wallet endpoint: the configured one, else the host's.
async fn connect<H: FrameHost>(
    config: &AppConfig,
    host: Option<&H>,
) -> Result<Option<RpcWallet>> {
    let url = match (&config.rpc_url, host) {
        (Some(url), _) => Some(url.clone()),
        (None, Some(host)) => host.ethereum_provider_url().await.unwrap_or_else(|err| {
            warn!(error = %err, "host did not provide a wallet endpoint");
            None
        }),
        (None, None) => None,
    };
    match url {
        Some(url) => {
            let wallet = RpcWallet::new(url)?;
            info!(url = wallet.url(), "using wallet endpoint");
            Ok(Some(wallet))
        }
        None => {
            warn!("no wallet endpoint configured");
            Ok(None)
        }
    }
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let host = config
        .frame_host
        .as_deref()
        .map(HttpFrameHost::new)
        .transpose()?;
    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    info!(strategy = %config.strategy, "starting hyperploy");
    ui::terminal_enter(&mut ui_state)?;
    let res = async {
        ui::draw_splash(&mut ui_state)?;
        let outcome = bootstrap::initialize(host.as_ref()).await;
        info!(?outcome, "bootstrap finished");

        let provider = connect(&config, host.as_ref()).await?;
        let flow = DeployFlowController::new(WalletContext::new(provider, host), config.strategy)
            .wrap_err("failed to build deployment request")?;
        let controller = AppController::new(flow);
        run_loop(controller, &mut ui_state, &mut input_events, config.poll_interval).await
    }
    .await;
    ui::terminal_exit()?;
    res
}

async fn run_loop<P: WalletProvider, H: FrameHost>(
    mut controller: AppController<P, H>,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEvents,
    poll_interval: Duration,
) -> Result<()> {
    let mut ticker = time::interval(poll_interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    ui::draw(ui_state, &controller.snapshot())?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => { break; }
            _ = ticker.tick() => {
                controller.tick().await;
            }
            ev = input_events.next() => {
                let Some(ev) = ev else { break; };
                match ui::map_event(ui_state, ev?) {
                    None | Some(ui::UserEvent::Redraw) => {}
                    Some(ui::UserEvent::Quit) => break,
                    Some(ui::UserEvent::StartDeploying) => controller.open_deploy().await,
                    Some(ui::UserEvent::Refresh) => controller.refresh().await,
                    Some(ui::UserEvent::Back) => controller.back_to_landing(),
                    Some(ui::UserEvent::ViewSuccess) => controller.view_success(),
                    Some(ui::UserEvent::Deploy) => {
                        if let Some(from) = controller.prepare_submit().await {
                            ui::draw(ui_state, &controller.snapshot())
                                .wrap_err("failed to draw submitting state")?;
                            controller.finish_submit(from).await;
                        }
                    }
                }
            }
        }
        ui::draw(ui_state, &controller.snapshot())?;
    }
    Ok(())
}
