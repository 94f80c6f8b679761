mod rpc;

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
pub use rpc::{RpcClient, RpcTransport};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error building the HTTP transport
    #[error("failed to build http client: {0}")]
    Builder(#[source] reqwest::Error),

    /// Error connecting to the RPC endpoint
    #[error("rpc call failed: {0}")]
    Connection(#[source] reqwest::Error),

    /// Endpoint answered with a non-success HTTP status
    #[error("rpc endpoint returned {status}: {body}")]
    Http { status: u16, body: String },

    /// Error object in the JSON-RPC envelope
    #[error("rpc error: {message}")]
    Rpc { code: i64, message: String },

    /// Response body was not a JSON-RPC envelope
    #[error("invalid rpc response: {0}")]
    InvalidResponse(String),

    /// Error with private key
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
}

/// Build the HTTP transport shared by every outbound call of a command.
///
/// `timeout` bounds each request individually. With `insecure` set, TLS
/// certificates are not verified.
pub fn create_http_client(insecure: bool, timeout: Duration) -> Result<reqwest::Client, ClientError> {
    if insecure {
        warn!("TLS certificate verification disabled");
    }

    reqwest::Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(insecure)
        .build()
        .map_err(ClientError::Builder)
}

/// Parse a hex private key (with or without `0x`) into a local signer.
pub fn create_signer(private_key: &str) -> Result<PrivateKeySigner, ClientError> {
    private_key
        .trim()
        .parse()
        .map_err(|e| ClientError::InvalidPrivateKey(format!("{}", e)))
}

/// Derive the public address for a private key.
pub fn signer_address(private_key: &str) -> Result<Address, ClientError> {
    Ok(create_signer(private_key)?.address())
}
