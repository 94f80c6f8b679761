//! Step 1: the unauthenticated request.

use crate::{
    header::{self, PAYMENT_REQUIRED},
    EndpointTarget, PaymentError, PaymentRequired, Reply,
};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// How the endpoint answered without payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeClass {
    /// 200: the route needs no payment
    Free,
    /// 402: payment required
    PaymentRequired,
    /// Any other status
    Unclassified,
}

/// Result of the unauthenticated request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutcome {
    pub status_code: u16,
    pub payment_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_requirements: Option<Value>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
}

impl ProbeOutcome {
    pub fn from_reply(reply: &Reply) -> Self {
        Self {
            status_code: reply.status.as_u16(),
            payment_required: reply.status == StatusCode::PAYMENT_REQUIRED,
            payment_requirements: header::header_json(&reply.headers, &[PAYMENT_REQUIRED]),
            body: reply.text(),
        }
    }

    pub fn class(&self) -> ProbeClass {
        match StatusCode::from_u16(self.status_code) {
            Ok(StatusCode::OK) => ProbeClass::Free,
            Ok(StatusCode::PAYMENT_REQUIRED) => ProbeClass::PaymentRequired,
            _ => ProbeClass::Unclassified,
        }
    }

    /// Typed requirements from the header document, falling back to a
    /// version 1 body.
    pub fn requirements(&self) -> Option<PaymentRequired> {
        self.payment_requirements
            .as_ref()
            .and_then(PaymentRequired::from_value)
            .or_else(|| {
                serde_json::from_str::<Value>(&self.body)
                    .ok()
                    .as_ref()
                    .and_then(PaymentRequired::from_value)
            })
            .filter(|required| !required.accepts.is_empty())
    }
}

/// Send `target` without payment and classify the answer.
///
/// Any HTTP status is a valid outcome; only transport failures are errors.
pub async fn probe(client: &reqwest::Client, target: &EndpointTarget) -> Result<(ProbeOutcome, Reply), PaymentError> {
    debug!(method = %target.method(), url = %target.url(), "Probing endpoint");

    let response = target.request(client).send().await?;
    let reply = Reply::read(response).await?;
    let outcome = ProbeOutcome::from_reply(&reply);

    debug!(status = outcome.status_code, class = ?outcome.class(), "Probe complete");

    Ok((outcome, reply))
}
