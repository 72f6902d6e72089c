use crate::{
    constants::SPLASH_TIMEOUT,
    error::WalletError,
    frame::{
        FrameHost,
        ReadyOptions,
    },
};
use std::{
    future::Future,
    time::Duration,
};
use tracing::{
    debug,
    error,
    info,
    warn,
};

/// Which signal ended the splash screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Ready,
    TimedOut,
    Failed(WalletError),
}

/// First of two signals: the readiness future or the timer. The loser is
/// dropped.
pub async fn race_ready<F>(ready: F, timeout: Duration) -> BootstrapOutcome
where
    F: Future<Output = Result<(), WalletError>>,
{
    tokio::select! {
        res = ready => match res {
            Ok(()) => BootstrapOutcome::Ready,
            Err(err) => BootstrapOutcome::Failed(err),
        },
        _ = tokio::time::sleep(timeout) => BootstrapOutcome::TimedOut,
    }
}

/// Signals readiness to the host and asks to be added as a Mini App.
///
/// Nothing here blocks startup: without a host the splash ends at once, and
/// every host failure is logged and ignored.
pub async fn initialize<H: FrameHost>(host: Option<&H>) -> BootstrapOutcome {
    let Some(host) = host else {
        debug!("no frame host, skipping bootstrap");
        return BootstrapOutcome::Ready;
    };
    let outcome = race_ready(
        host.ready(ReadyOptions {
            disable_native_gestures: true,
        }),
        SPLASH_TIMEOUT,
    )
    .await;
    match &outcome {
        BootstrapOutcome::Ready => info!("host acknowledged ready"),
        BootstrapOutcome::TimedOut => {
            warn!(timeout_ms = SPLASH_TIMEOUT.as_millis() as u64, "host ready timed out")
        }
        BootstrapOutcome::Failed(err) => error!(error = %err, "host ready failed"),
    }

    match host.is_in_mini_app().await {
        Ok(true) => {
            if let Err(err) = host.add_mini_app().await {
                warn!(error = %err, "add mini app failed");
            }
        }
        Ok(false) => debug!("not running inside a mini app"),
        Err(err) => warn!(error = %err, "mini app detection failed"),
    }
    outcome
}
