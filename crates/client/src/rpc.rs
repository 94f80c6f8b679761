//! Minimal JSON-RPC client for read-only contract calls.
//!
//! Sends a single `eth_call` envelope over HTTP and returns the raw hex
//! result. Decoding of the result is left to the caller.

use crate::ClientError;
use alloy_primitives::{Address, Bytes};
use alloy_rpc_types_eth::BlockNumberOrTag;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
};
use tracing::debug;

/// Transport capable of issuing `eth_call` against an arbitrary endpoint.
pub trait RpcTransport: Send + Sync {
    /// Execute `data` against contract `to` at the latest block.
    ///
    /// Returns the hex-encoded return data exactly as the node sent it.
    fn eth_call(
        &self,
        rpc_url: &str,
        to: Address,
        data: Bytes,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}

/// JSON-RPC client over a shared `reqwest` transport.
#[derive(Debug)]
pub struct RpcClient {
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcClient {
    pub const fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            next_id: AtomicU64::new(1),
        }
    }

    /// Issue a single JSON-RPC request and extract its result.
    pub async fn request<P, R>(&self, rpc_url: &str, method: &str, params: P) -> Result<R, ClientError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        debug!(%rpc_url, method, id = request.id, "Sending JSON-RPC request");

        let response = self
            .client
            .post(rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(ClientError::Connection)?;

        let status = response.status();
        let body = response.text().await.map_err(ClientError::Connection)?;

        if !status.is_success() {
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let rpc_response: JsonRpcResponse<R> = serde_json::from_str(&body)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        if let Some(error) = rpc_response.error {
            return Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response
            .result
            .ok_or_else(|| ClientError::InvalidResponse("missing result".to_string()))
    }
}

impl RpcTransport for RpcClient {
    async fn eth_call(&self, rpc_url: &str, to: Address, data: Bytes) -> Result<String, ClientError> {
        let call = CallRequest { to, data };
        self.request(rpc_url, "eth_call", (call, BlockNumberOrTag::Latest))
            .await
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T> {
    jsonrpc: &'static str,
    method: &'a str,
    params: T,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// `eth_call` transaction object; only the fields a view call needs.
#[derive(Debug, Serialize)]
struct CallRequest {
    to: Address,
    data: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, bytes};
    use mockito::Matcher;
    use serde_json::json;

    const TOKEN: Address = address!("036CbD53842c5426634e7929541eC2318f3dCF7e");

    #[tokio::test]
    async fn test_eth_call_result() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({ "jsonrpc": "2.0", "method": "eth_call" })),
                Matcher::Regex(r#"(?i)"to":"0x036cbd53842c5426634e7929541ec2318f3dcf7e""#.to_string()),
                Matcher::Regex(r#""data":"0x70a08231""#.to_string()),
                Matcher::Regex(r#""latest""#.to_string()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x00000000000000000000000000000000000000000000000000000000000f4240"}"#)
            .create_async()
            .await;

        let client = RpcClient::new(reqwest::Client::new());
        let result = client
            .eth_call(&server.url(), TOKEN, bytes!("70a08231"))
            .await
            .unwrap();

        assert!(result.ends_with("0f4240"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rpc_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"execution reverted"}}"#)
            .create_async()
            .await;

        let client = RpcClient::new(reqwest::Client::new());
        let err = client
            .eth_call(&server.url(), TOKEN, Bytes::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Rpc { code: -32000, .. }));
        assert_eq!(err.to_string(), "rpc error: execution reverted");
    }

    #[tokio::test]
    async fn test_invalid_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let client = RpcClient::new(reqwest::Client::new());
        let err = client
            .eth_call(&server.url(), TOKEN, Bytes::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_http_status_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let client = RpcClient::new(reqwest::Client::new());
        let err = client
            .eth_call(&server.url(), TOKEN, Bytes::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Http { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let client = RpcClient::new(reqwest::Client::new());
        let err = client
            .eth_call("http://127.0.0.1:1", TOKEN, Bytes::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Connection(_)));
    }
}
