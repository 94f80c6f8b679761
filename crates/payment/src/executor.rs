//! Step 2: the request with payment attached.

use crate::{
    header::{self, PAYMENT_RESPONSE, X_PAYMENT_RESPONSE},
    EndpointTarget, PaymentError, Reply,
};
use alloy_primitives::Address;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tracing::{debug, info};

/// An HTTP transport able to pay for what it requests.
pub trait PaymentTransport: Send + Sync {
    /// Send `target`. If the server answers 402, negotiate and attach a
    /// signed payment and resubmit exactly once.
    ///
    /// Returns the final response, whatever its status.
    fn send(&self, target: &EndpointTarget) -> impl Future<Output = Result<Reply, PaymentError>> + Send;
}

/// A payment scheme implementation.
pub trait PaymentBackend: Send + Sync {
    type Transport: PaymentTransport;

    /// Public identity of the signer behind `credential`.
    fn signer_address(&self, credential: &str) -> Result<Address, PaymentError>;

    /// Wrap `client` so that it pays with `credential`.
    fn wrap(&self, client: reqwest::Client, credential: &str) -> Result<Self::Transport, PaymentError>;
}

/// How the paid request was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementClass {
    /// 200: payment accepted
    Accepted,
    /// 402 again: payment declined by the facilitator
    Rejected,
    /// Any other status
    Unexpected(u16),
}

/// Result of the paid request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub status_code: u16,
    pub accepted: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub signer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_response: Option<Value>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
}

impl PaymentOutcome {
    pub fn from_reply(reply: &Reply, signer: Address) -> Self {
        Self {
            status_code: reply.status.as_u16(),
            accepted: reply.status == StatusCode::OK,
            signer: signer.to_string(),
            payment_response: header::header_json(&reply.headers, &[PAYMENT_RESPONSE, X_PAYMENT_RESPONSE]),
            body: reply.text(),
        }
    }

    pub fn class(&self) -> SettlementClass {
        match StatusCode::from_u16(self.status_code) {
            Ok(StatusCode::OK) => SettlementClass::Accepted,
            Ok(StatusCode::PAYMENT_REQUIRED) => SettlementClass::Rejected,
            _ => SettlementClass::Unexpected(self.status_code),
        }
    }
}

/// Runs the paid request through a backend transport.
pub struct Executor<T> {
    transport: T,
    signer: Address,
}

impl<T> Executor<T>
where
    T: PaymentTransport,
{
    /// Build the paying transport.
    ///
    /// Fails before any network call when the credential is absent or
    /// malformed.
    pub fn prepare<B>(backend: &B, client: reqwest::Client, credential: Option<&str>) -> Result<Self, PaymentError>
    where
        B: PaymentBackend<Transport = T>,
    {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(PaymentError::MissingCredential)?;

        let signer = backend.signer_address(credential)?;
        let transport = backend.wrap(client, credential)?;
        info!(%signer, "Payment signer ready");

        Ok(Self { transport, signer })
    }

    pub const fn signer(&self) -> Address {
        self.signer
    }

    /// Send `target` with payment and classify the final response.
    pub async fn execute(&self, target: &EndpointTarget) -> Result<(PaymentOutcome, Reply), PaymentError> {
        debug!(method = %target.method(), url = %target.url(), "Sending paid request");

        let reply = self.transport.send(target).await?;
        let outcome = PaymentOutcome::from_reply(&reply, self.signer);

        debug!(status = outcome.status_code, class = ?outcome.class(), "Paid request complete");

        Ok((outcome, reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::encode_base64_json;
    use alloy_primitives::address;
    use reqwest::{header::HeaderMap, Version};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SIGNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    struct FixedTransport {
        status: StatusCode,
        headers: HeaderMap,
    }

    impl PaymentTransport for FixedTransport {
        async fn send(&self, _target: &EndpointTarget) -> Result<Reply, PaymentError> {
            Ok(Reply {
                status: self.status,
                version: Version::HTTP_11,
                headers: self.headers.clone(),
                body: b"paid content".to_vec(),
            })
        }
    }

    #[derive(Default)]
    struct FixedBackend {
        status: Option<StatusCode>,
        wrapped: AtomicUsize,
    }

    impl PaymentBackend for FixedBackend {
        type Transport = FixedTransport;

        fn signer_address(&self, credential: &str) -> Result<Address, PaymentError> {
            if credential == "bad" {
                return Err(PaymentError::Signer("malformed".into()));
            }
            Ok(SIGNER)
        }

        fn wrap(&self, _client: reqwest::Client, _credential: &str) -> Result<FixedTransport, PaymentError> {
            self.wrapped.fetch_add(1, Ordering::SeqCst);
            let mut headers = HeaderMap::new();
            let settlement = encode_base64_json(&json!({ "success": true, "transaction": "0xabc" })).unwrap();
            headers.insert(PAYMENT_RESPONSE, settlement.parse().unwrap());
            Ok(FixedTransport {
                status: self.status.unwrap_or(StatusCode::OK),
                headers,
            })
        }
    }

    fn target() -> EndpointTarget {
        EndpointTarget::new("http://localhost/paid", "GET", None, &[]).unwrap()
    }

    #[test]
    fn test_missing_credential() {
        let backend = FixedBackend::default();
        for credential in [None, Some(""), Some("   ")] {
            let result = Executor::prepare(&backend, reqwest::Client::new(), credential);
            assert!(matches!(result, Err(PaymentError::MissingCredential)));
        }
        assert_eq!(backend.wrapped.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_malformed_credential() {
        let backend = FixedBackend::default();
        let result = Executor::prepare(&backend, reqwest::Client::new(), Some("bad"));
        assert!(matches!(result, Err(PaymentError::Signer(_))));
    }

    #[tokio::test]
    async fn test_accepted_with_settlement() {
        let backend = FixedBackend::default();
        let executor = Executor::prepare(&backend, reqwest::Client::new(), Some("key")).unwrap();

        let (outcome, _) = executor.execute(&target()).await.unwrap();

        assert!(outcome.accepted);
        assert_eq!(outcome.class(), SettlementClass::Accepted);
        assert_eq!(outcome.signer, SIGNER.to_string());
        assert_eq!(outcome.payment_response.unwrap()["transaction"], "0xabc");
        assert_eq!(outcome.body, "paid content");
    }

    #[tokio::test]
    async fn test_rejected_and_unexpected() {
        let backend = FixedBackend {
            status: Some(StatusCode::PAYMENT_REQUIRED),
            ..Default::default()
        };
        let executor = Executor::prepare(&backend, reqwest::Client::new(), Some("key")).unwrap();
        let (outcome, _) = executor.execute(&target()).await.unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.class(), SettlementClass::Rejected);

        let backend = FixedBackend {
            status: Some(StatusCode::BAD_GATEWAY),
            ..Default::default()
        };
        let executor = Executor::prepare(&backend, reqwest::Client::new(), Some("key")).unwrap();
        let (outcome, _) = executor.execute(&target()).await.unwrap();
        assert_eq!(outcome.class(), SettlementClass::Unexpected(502));
    }
}
