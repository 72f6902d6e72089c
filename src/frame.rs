use crate::{
    constants::REQUIRED_CHAIN_ID,
    error::WalletError,
};
use alloy_primitives::{
    Address,
    B256,
    U256,
};
use serde::{
    Deserialize,
    Serialize,
    de::DeserializeOwned,
};
use tracing::{
    debug,
    warn,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyOptions {
    pub disable_native_gestures: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTokenRequest {
    /// CAIP-19 asset id of the token to send.
    pub token: String,
    /// Amount in the token's smallest unit, as a decimal string.
    pub amount: String,
    pub recipient_address: Address,
}

impl SendTokenRequest {
    pub fn native(amount: U256, recipient: Address) -> Self {
        Self {
            token: native_token_id(REQUIRED_CHAIN_ID),
            amount: amount.to_string(),
            recipient_address: recipient,
        }
    }
}

pub fn native_token_id(chain_id: u64) -> String {
    format!("eip155:{chain_id}/native")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendTokenOutcome {
    Sent { transaction: B256 },
    Failed {
        reason: String,
        message: Option<String>,
    },
}

impl SendTokenOutcome {
    pub const REJECTED_BY_USER: &'static str = "rejected_by_user";

    pub fn into_result(self) -> Result<B256, WalletError> {
        match self {
            SendTokenOutcome::Sent { transaction } => Ok(transaction),
            SendTokenOutcome::Failed { reason, message } => {
                if reason == Self::REJECTED_BY_USER {
                    Err(WalletError::UserRejected { message })
                } else {
                    Err(WalletError::Rpc {
                        code: 0,
                        message: reason,
                        reason: message,
                    })
                }
            }
        }
    }
}

#[derive(Deserialize)]
struct SendTokenResponse {
    success: bool,
    #[serde(default)]
    send: Option<SentTransaction>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    error: Option<SendTokenErrorDetail>,
}

#[derive(Deserialize)]
struct SentTransaction {
    transaction: B256,
}

#[derive(Deserialize)]
struct SendTokenErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl TryFrom<SendTokenResponse> for SendTokenOutcome {
    type Error = WalletError;

    fn try_from(res: SendTokenResponse) -> Result<Self, Self::Error> {
        if res.success {
            let send = res.send.ok_or_else(|| {
                WalletError::InvalidResponse(String::from(
                    "sendToken reported success without a transaction",
                ))
            })?;
            return Ok(SendTokenOutcome::Sent {
                transaction: send.transaction,
            });
        }
        Ok(SendTokenOutcome::Failed {
            reason: res.reason.unwrap_or_else(|| String::from("send_failed")),
            message: res.error.and_then(|e| e.message),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostContext {
    #[serde(default)]
    pub is_in_mini_app: bool,
    #[serde(default)]
    pub ethereum_provider_url: Option<String>,
}

/// Actions offered by a Mini App host embedding this app.
pub trait FrameHost {
    fn is_in_mini_app(&self) -> impl Future<Output = Result<bool, WalletError>>;

    fn ready(&self, options: ReadyOptions) -> impl Future<Output = Result<(), WalletError>>;

    fn add_mini_app(&self) -> impl Future<Output = Result<(), WalletError>>;

    /// Endpoint of the host's Ethereum wallet, if it exposes one.
    fn ethereum_provider_url(&self) -> impl Future<Output = Result<Option<String>, WalletError>>;

    fn send_token(
        &self,
        request: &SendTokenRequest,
    ) -> impl Future<Output = Result<SendTokenOutcome, WalletError>>;
}

/// Host reached through its HTTP bridge.
#[derive(Clone, Debug)]
pub struct HttpFrameHost {
    base_url: String,
    http: reqwest::Client,
}

impl HttpFrameHost {
    pub fn new(base_url: impl Into<String>) -> Result<Self, WalletError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder().build().map_err(|e| {
            WalletError::Transport(format!("failed to build HTTP client for host: {e}"))
        })?;
        Ok(Self { base_url, http })
    }

    async fn context(&self) -> Result<HostContext, WalletError> {
        let url = format!("{}/context", self.base_url);
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| WalletError::Transport(format!("host request failed: {e}")))?;
        Self::decode(res, "context").await
    }

    async fn action<B: Serialize, T: DeserializeOwned>(
        &self,
        name: &str,
        body: &B,
    ) -> Result<T, WalletError> {
        let url = format!("{}/actions/{}", self.base_url, name);
        debug!(action = name, "host action");
        let res = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| WalletError::Transport(format!("host {name} failed: {e}")))?;
        Self::decode(res, name).await
    }

    async fn decode<T: DeserializeOwned>(
        res: reqwest::Response,
        what: &str,
    ) -> Result<T, WalletError> {
        let status = res.status();
        let bytes = res.bytes().await.map_err(|e| {
            WalletError::Transport(format!("failed to read host {what} response: {e}"))
        })?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            warn!(what, %status, "host responded with error");
            return Err(WalletError::Transport(format!(
                "host responded with {status} to {what}: {body}"
            )));
        }
        let body: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(body)
            .map_err(|e| WalletError::InvalidResponse(format!("invalid host {what} payload: {e}")))
    }
}

impl FrameHost for HttpFrameHost {
    async fn is_in_mini_app(&self) -> Result<bool, WalletError> {
        Ok(self.context().await?.is_in_mini_app)
    }

    async fn ready(&self, options: ReadyOptions) -> Result<(), WalletError> {
        let _: Option<serde_json::Value> = self.action("ready", &options).await?;
        Ok(())
    }

    async fn add_mini_app(&self) -> Result<(), WalletError> {
        let _: Option<serde_json::Value> =
            self.action("addMiniApp", &serde_json::json!({})).await?;
        Ok(())
    }

    async fn ethereum_provider_url(&self) -> Result<Option<String>, WalletError> {
        Ok(self.context().await?.ethereum_provider_url)
    }

    async fn send_token(
        &self,
        request: &SendTokenRequest,
    ) -> Result<SendTokenOutcome, WalletError> {
        let res: SendTokenResponse = self.action("sendToken", request).await?;
        res.try_into()
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::constants::{
        DEPLOYER_ADDRESS,
        DEPLOYMENT_FEE_WEI,
    };
    use serde_json::json;
    use wiremock::{
        Mock,
        MockServer,
        ResponseTemplate,
        matchers::{
            body_json,
            method,
            path,
        },
    };

    #[test]
    fn send_token_request__native_fee_uses_wei_and_caip19() {
        let req = SendTokenRequest::native(DEPLOYMENT_FEE_WEI, DEPLOYER_ADDRESS);
        assert_eq!("eip155:12121/native", req.token);
        assert_eq!("3000000000000000", req.amount);
    }

    #[test]
    fn into_result__when_rejected_by_user__then_user_rejected() {
        let outcome = SendTokenOutcome::Failed {
            reason: String::from("rejected_by_user"),
            message: None,
        };
        assert_eq!(
            Err(WalletError::UserRejected { message: None }),
            outcome.into_result()
        );
    }

    #[test]
    fn into_result__when_send_failed__then_message_surfaces() {
        let outcome = SendTokenOutcome::Failed {
            reason: String::from("send_failed"),
            message: Some(String::from("gas estimation failed")),
        };
        let err = outcome.into_result().unwrap_err();
        assert_eq!("gas estimation failed", err.user_message());
    }

    #[tokio::test]
    async fn context__reads_mini_app_flag_and_provider() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/context"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isInMiniApp": true,
                "ethereumProviderUrl": "http://127.0.0.1:1248"
            })))
            .mount(&server)
            .await;
        let sut = HttpFrameHost::new(format!("{}/", server.uri())).unwrap();

        assert!(sut.is_in_mini_app().await.unwrap());
        assert_eq!(
            Some(String::from("http://127.0.0.1:1248")),
            sut.ethereum_provider_url().await.unwrap()
        );
    }

    #[tokio::test]
    async fn send_token__success_returns_transaction() {
        let server = MockServer::start().await;
        let request = SendTokenRequest::native(DEPLOYMENT_FEE_WEI, DEPLOYER_ADDRESS);
        Mock::given(method("POST"))
            .and(path("/actions/sendToken"))
            .and(body_json(&request))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "send": { "transaction": B256::repeat_byte(0xab) }
            })))
            .mount(&server)
            .await;
        let sut = HttpFrameHost::new(server.uri()).unwrap();

        let outcome = sut.send_token(&request).await.unwrap();

        assert_eq!(
            SendTokenOutcome::Sent {
                transaction: B256::repeat_byte(0xab)
            },
            outcome
        );
    }

    #[tokio::test]
    async fn send_token__failure_is_structured_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/actions/sendToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "reason": "rejected_by_user"
            })))
            .mount(&server)
            .await;
        let sut = HttpFrameHost::new(server.uri()).unwrap();
        let request = SendTokenRequest::native(DEPLOYMENT_FEE_WEI, DEPLOYER_ADDRESS);

        let outcome = sut.send_token(&request).await.unwrap();

        assert_eq!(
            SendTokenOutcome::Failed {
                reason: String::from("rejected_by_user"),
                message: None
            },
            outcome
        );
    }

    #[tokio::test]
    async fn ready__when_host_errors__then_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/actions/ready"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let sut = HttpFrameHost::new(server.uri()).unwrap();

        let err = sut.ready(ReadyOptions::default()).await.unwrap_err();

        assert!(matches!(err, WalletError::Transport(_)));
    }
}
