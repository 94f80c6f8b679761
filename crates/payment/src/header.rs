//! Base64-encoded JSON documents carried in x402 headers.

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Payment requirements sent with a 402 response.
pub const PAYMENT_REQUIRED: &str = "payment-required";
/// Settlement result sent with the paid response.
pub const PAYMENT_RESPONSE: &str = "payment-response";
/// Signed payment sent by protocol version 2 clients.
pub const PAYMENT_SIGNATURE: &str = "payment-signature";
/// Signed payment sent by protocol version 1 clients.
pub const X_PAYMENT: &str = "x-payment";
/// Settlement result sent by protocol version 1 servers.
pub const X_PAYMENT_RESPONSE: &str = "x-payment-response";

/// Decode a base64 JSON document, or `None` if either layer is malformed.
pub fn decode_base64_json(value: &str) -> Option<Value> {
    let decoded = STANDARD.decode(value.trim()).ok()?;
    serde_json::from_slice(&decoded).ok()
}

/// Best-effort extraction of the first present header among `names`.
///
/// A missing header yields `None` silently; a malformed one yields `None`
/// with a warning.
pub fn header_json(headers: &HeaderMap, names: &[&str]) -> Option<Value> {
    let (name, raw) = names
        .iter()
        .find_map(|name| headers.get(*name).map(|v| (*name, v)))?;

    let decoded = raw.to_str().ok().and_then(decode_base64_json);
    if decoded.is_none() {
        warn!(header = name, "Ignoring undecodable header");
    }

    decoded
}

/// Encode a document for an outgoing x402 header.
pub fn encode_base64_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(value)?;
    Ok(STANDARD.encode(json))
}
