use alloy_primitives::U256;
use thiserror::Error;

/// EIP-1193 code for a request the user declined in the wallet.
pub const USER_REJECTED_CODE: i64 = 4001;

pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error during deployment.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("no wallet provider available")]
    NoProvider,
    #[error("wallet present but no signing endpoint could be obtained")]
    ProviderUnavailable,
    #[error("no account connected")]
    NotConnected,
    #[error("wrong network: expected chain {expected}, connected to {actual:?}")]
    WrongNetwork { expected: u64, actual: Option<u64> },
    #[error("insufficient balance: need {required} wei, have {available} wei")]
    InsufficientBalance { required: U256, available: U256 },
    #[error("request rejected by user: {message:?}")]
    UserRejected { message: Option<String> },
    #[error("rpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        reason: Option<String>,
    },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl WalletError {
    /// Builds the error for a JSON-RPC failure, recognising user rejection.
    pub fn from_rpc(code: i64, message: String, reason: Option<String>) -> Self {
        if code == USER_REJECTED_CODE {
            let message = reason.or(Some(message)).filter(|m| !m.is_empty());
            return WalletError::UserRejected { message };
        }
        WalletError::Rpc {
            code,
            message,
            reason,
        }
    }

    /// Text shown to the user for this failure.
    ///
    /// Lookup order: the nested reason reported by the wallet or node, then
    /// the top-level message, then a fixed fallback.
    pub fn user_message(&self) -> String {
        match self {
            WalletError::NoProvider => String::from(
                "Wallet not detected. Please install it or use a browser with Web3 support.",
            ),
            WalletError::ProviderUnavailable => {
                String::from("Wallet provider unavailable. Reopen the app in your wallet.")
            }
            WalletError::NotConnected => String::from("Connect your wallet to deploy."),
            WalletError::WrongNetwork { .. } => {
                String::from("Please switch to the HyperEVM network.")
            }
            WalletError::InsufficientBalance { available, .. } => format!(
                "Insufficient balance (you have {} {})",
                crate::units::format_native(*available),
                crate::constants::NATIVE_SYMBOL
            ),
            WalletError::UserRejected { message } => non_empty(message.as_deref())
                .unwrap_or("User rejected the request.")
                .to_string(),
            WalletError::Rpc {
                message, reason, ..
            } => non_empty(reason.as_deref())
                .or_else(|| non_empty(Some(message.as_str())))
                .unwrap_or(UNKNOWN_ERROR_MESSAGE)
                .to_string(),
            WalletError::Transport(message) | WalletError::InvalidResponse(message) => {
                non_empty(Some(message.as_str()))
                    .unwrap_or(UNKNOWN_ERROR_MESSAGE)
                    .to_string()
            }
        }
    }

    /// Policy errors block submission but are shown as warnings, not failures.
    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            WalletError::NotConnected
                | WalletError::WrongNetwork { .. }
                | WalletError::InsufficientBalance { .. }
        )
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}
