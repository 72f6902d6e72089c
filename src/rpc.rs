use crate::{
    error::WalletError,
    provider::{
        TransactionReceipt,
        TransactionRequest,
        WalletProvider,
    },
};
use alloy_primitives::{
    Address,
    B256,
    U64,
    U256,
};
use serde::{
    Deserialize,
    Serialize,
    de::DeserializeOwned,
};
use serde_json::{
    Value,
    json,
};
use std::sync::{
    Arc,
    atomic::{
        AtomicU64,
        Ordering,
    },
};
use tracing::{
    debug,
    warn,
};

/// Wallet reached over JSON-RPC 2.0 on HTTP.
///
/// The endpoint holds the keys: accounts come from `eth_accounts` and
/// `eth_sendTransaction` is signed on the wallet side.
#[derive(Clone, Debug)]
pub struct RpcWallet {
    url: String,
    http: reqwest::Client,
    next_id: Arc<AtomicU64>,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcErrorObject {
    /// Nested reason carried in `data`, as wallets and nodes report it.
    fn reason(&self) -> Option<String> {
        match self.data.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => ["message", "reason"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(str::to_string),
            _ => None,
        }
    }
}

impl RpcWallet {
    pub fn new(url: impl Into<String>) -> Result<Self, WalletError> {
        let http = reqwest::Client::builder().build().map_err(|e| {
            WalletError::Transport(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(Self {
            url: url.into(),
            http,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, WalletError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!(method, id = request.id, "rpc request");
        let res = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| WalletError::Transport(format!("{method} request failed: {e}")))?;
        let status = res.status();
        let bytes = res.bytes().await.map_err(|e| {
            WalletError::Transport(format!("failed to read {method} response: {e}"))
        })?;
        let response: RpcResponse = match serde_json::from_slice(&bytes) {
            Ok(response) => response,
            Err(_) if !status.is_success() => {
                return Err(WalletError::Transport(format!(
                    "wallet responded with {status} to {method}: {}",
                    String::from_utf8_lossy(&bytes)
                )));
            }
            Err(e) => {
                return Err(WalletError::InvalidResponse(format!(
                    "invalid {method} payload: {e}"
                )));
            }
        };
        if let Some(error) = response.error {
            let reason = error.reason();
            warn!(method, code = error.code, message = %error.message, "rpc error");
            return Err(WalletError::from_rpc(error.code, error.message, reason));
        }
        let result = response.result.unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(|e| {
            WalletError::InvalidResponse(format!("unexpected {method} result: {e}"))
        })
    }
}

impl WalletProvider for RpcWallet {
    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.call("eth_accounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        let id: U64 = self.call("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    async fn balance(&self, address: Address) -> Result<U256, WalletError> {
        self.call("eth_getBalance", json!([address, "latest"])).await
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, WalletError> {
        self.call("eth_sendTransaction", json!([tx])).await
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, WalletError> {
        self.call("eth_getTransactionReceipt", json!([hash])).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use alloy_primitives::{
        Bytes,
        address,
        b256,
    };
    use wiremock::{
        Mock,
        MockServer,
        ResponseTemplate,
        matchers::{
            body_partial_json,
            method,
        },
    };

    async fn mock_result(server: &MockServer, rpc_method: &str, result: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": result })),
            )
            .mount(server)
            .await;
    }

    async fn mock_error(server: &MockServer, rpc_method: &str, error: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "error": error })),
            )
            .mount(server)
            .await;
    }

    fn sample_tx() -> TransactionRequest {
        TransactionRequest {
            from: address!("0x00000000000000000000000000000000000a11ce"),
            to: crate::constants::DEPLOYER_ADDRESS,
            value: crate::constants::DEPLOYMENT_FEE_WEI,
            data: Bytes::from_static(&[0xde, 0xad]),
        }
    }

    #[tokio::test]
    async fn chain_id__parses_hex_quantity() {
        let server = MockServer::start().await;
        mock_result(&server, "eth_chainId", json!("0x2f59")).await;
        let sut = RpcWallet::new(server.uri()).unwrap();

        let chain_id = sut.chain_id().await.unwrap();

        assert_eq!(12121, chain_id);
    }

    #[tokio::test]
    async fn accounts__when_none_authorized__then_empty() {
        let server = MockServer::start().await;
        mock_result(&server, "eth_accounts", json!([])).await;
        let sut = RpcWallet::new(server.uri()).unwrap();

        let accounts = sut.accounts().await.unwrap();

        assert!(accounts.is_empty());
    }

    #[tokio::test]
    async fn balance__parses_wei() {
        let server = MockServer::start().await;
        mock_result(&server, "eth_getBalance", json!("0x2386f26fc10000")).await;
        let sut = RpcWallet::new(server.uri()).unwrap();

        let balance = sut
            .balance(address!("0x00000000000000000000000000000000000a11ce"))
            .await
            .unwrap();

        assert_eq!(U256::from(10_000_000_000_000_000u64), balance);
    }

    #[tokio::test]
    async fn send_transaction__returns_hash() {
        let server = MockServer::start().await;
        let hash = b256!("0xdead00000000000000000000000000000000000000000000000000000000beef");
        mock_result(&server, "eth_sendTransaction", json!(hash)).await;
        let sut = RpcWallet::new(server.uri()).unwrap();

        let actual = sut.send_transaction(&sample_tx()).await.unwrap();

        assert_eq!(hash, actual);
    }

    #[tokio::test]
    async fn send_transaction__when_user_rejects__then_user_rejected() {
        let server = MockServer::start().await;
        mock_error(
            &server,
            "eth_sendTransaction",
            json!({ "code": 4001, "message": "User rejected" }),
        )
        .await;
        let sut = RpcWallet::new(server.uri()).unwrap();

        let err = sut.send_transaction(&sample_tx()).await.unwrap_err();

        assert_eq!("User rejected", err.user_message());
        assert!(matches!(err, WalletError::UserRejected { .. }));
    }

    #[tokio::test]
    async fn send_transaction__when_node_reports_nested_reason__then_reason_kept() {
        let server = MockServer::start().await;
        mock_error(
            &server,
            "eth_sendTransaction",
            json!({
                "code": -32000,
                "message": "execution reverted",
                "data": { "message": "fee below minimum" }
            }),
        )
        .await;
        let sut = RpcWallet::new(server.uri()).unwrap();

        let err = sut.send_transaction(&sample_tx()).await.unwrap_err();

        assert_eq!("fee below minimum", err.user_message());
    }

    #[tokio::test]
    async fn transaction_receipt__when_not_mined__then_none() {
        let server = MockServer::start().await;
        mock_result(&server, "eth_getTransactionReceipt", Value::Null).await;
        let sut = RpcWallet::new(server.uri()).unwrap();

        let receipt = sut.transaction_receipt(B256::ZERO).await.unwrap();

        assert!(receipt.is_none());
    }

    #[tokio::test]
    async fn call__when_http_error_without_json__then_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;
        let sut = RpcWallet::new(server.uri()).unwrap();

        let err = sut.chain_id().await.unwrap_err();

        assert!(matches!(err, WalletError::Transport(_)));
    }
}
