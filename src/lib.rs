pub mod bootstrap;

pub mod constants;

pub mod deployment;

pub mod error;

pub mod flow;

pub mod frame;

pub mod network;

pub mod provider;

pub mod rpc;

pub mod units;

pub mod wallet;

pub mod test_helpers;

pub use deployment::{
    DeploymentRequest,
    DeploymentResult,
    DeploymentSubmitter,
    SubmitStrategy,
};
pub use error::WalletError;
pub use flow::{
    DeployFlowController,
    FlowState,
    Readiness,
};
pub use wallet::{
    WalletContext,
    WalletSnapshot,
};
