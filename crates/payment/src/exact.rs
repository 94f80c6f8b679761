//! `exact` scheme on EVM networks: EIP-3009 `transferWithAuthorization`.
//!
//! The payer signs an EIP-712 authorization for exactly the requested amount;
//! the facilitator submits it on chain. No transaction is sent from here.

use crate::{
    header::{self, PAYMENT_SIGNATURE, X_PAYMENT},
    EndpointTarget, PaymentBackend, PaymentError, PaymentOption, PaymentRequired, PaymentTransport, ProbeOutcome,
    Reply,
};
use alloy_primitives::{hex, Address, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{Eip712Domain, SolStruct};
use binding::eip3009::TransferWithAuthorization;
use config::{parse_eip155_chain_id, NetworkRegistry};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Scheme identifier in payment options.
pub const SCHEME: &str = "exact";

/// Token domain version when the option does not name one.
const DEFAULT_DOMAIN_VERSION: &str = "2";

/// Validity window when the option does not set `maxTimeoutSeconds`.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Backdating of `validAfter` to tolerate clock skew with the chain.
const VALID_AFTER_SKEW_SECS: u64 = 600;

/// Backend for the `exact` scheme with local private keys.
#[derive(Debug, Clone, Default)]
pub struct ExactEvmBackend {
    registry: NetworkRegistry,
}

impl ExactEvmBackend {
    pub const fn new(registry: NetworkRegistry) -> Self {
        Self { registry }
    }
}

impl PaymentBackend for ExactEvmBackend {
    type Transport = ExactEvmTransport;

    fn signer_address(&self, credential: &str) -> Result<Address, PaymentError> {
        client::signer_address(credential).map_err(|e| PaymentError::Signer(e.to_string()))
    }

    fn wrap(&self, http: reqwest::Client, credential: &str) -> Result<ExactEvmTransport, PaymentError> {
        let signer = client::create_signer(credential).map_err(|e| PaymentError::Signer(e.to_string()))?;
        Ok(ExactEvmTransport {
            client: http,
            signer,
            registry: self.registry.clone(),
        })
    }
}

/// Paying HTTP transport for the `exact` scheme.
pub struct ExactEvmTransport {
    client: reqwest::Client,
    signer: PrivateKeySigner,
    registry: NetworkRegistry,
}

impl PaymentTransport for ExactEvmTransport {
    async fn send(&self, target: &EndpointTarget) -> Result<Reply, PaymentError> {
        let response = target.request(&self.client).send().await?;
        let reply = Reply::read(response).await?;
        if reply.status != StatusCode::PAYMENT_REQUIRED {
            return Ok(reply);
        }

        let required = ProbeOutcome::from_reply(&reply)
            .requirements()
            .ok_or_else(|| PaymentError::Requirements("402 response carried no payment options".into()))?;

        let payment = sign_payment(&self.signer, &self.registry, &required, unix_now())?;
        info!(
            network = %payment.network,
            amount = %payment.amount,
            header = payment.header,
            "Resubmitting with signed payment"
        );

        let response = target
            .request(&self.client)
            .header(payment.header, payment.value)
            .send()
            .await?;

        Reply::read(response).await
    }
}

/// A signed payment ready to attach to a request.
#[derive(Debug, Clone)]
pub struct SignedPayment {
    /// Header to carry the payload
    pub header: &'static str,
    /// Base64 encoded payload
    pub value: String,
    /// Decoded payload
    pub payload: Value,
    pub network: String,
    pub amount: String,
}

/// Sign an authorization for the first option this backend can pay.
///
/// `now` is the current unix time in seconds.
pub fn sign_payment(
    signer: &PrivateKeySigner,
    registry: &NetworkRegistry,
    required: &PaymentRequired,
    now: u64,
) -> Result<SignedPayment, PaymentError> {
    let (raw, option, chain_id) = required
        .options()
        .filter(|(_, opt)| opt.scheme == SCHEME)
        .find_map(|(raw, opt)| {
            let chain_id = parse_eip155_chain_id(&opt.network).or_else(|| registry.get(&opt.network).map(|n| n.chain_id))?;
            Some((raw, opt, chain_id))
        })
        .ok_or_else(|| {
            let offered = required
                .options()
                .map(|(_, opt)| format!("{}/{}", opt.scheme, opt.network))
                .collect::<Vec<_>>()
                .join(", ");
            PaymentError::Unsupported(format!("offered: [{offered}]"))
        })?;

    let authorization = authorization(signer.address(), &option, now)?;
    let domain = domain(&option, chain_id)?;

    let hash = authorization.eip712_signing_hash(&domain);
    let signature = signer
        .sign_hash_sync(&hash)
        .map_err(|e| PaymentError::Signing(e.to_string()))?;

    debug!(chain_id, from = %authorization.from, to = %authorization.to, "Signed transfer authorization");

    let exact = json!({
        "signature": hex::encode_prefixed(signature.as_bytes()),
        "authorization": {
            "from": authorization.from.to_string(),
            "to": authorization.to.to_string(),
            "value": authorization.value.to_string(),
            "validAfter": authorization.validAfter.to_string(),
            "validBefore": authorization.validBefore.to_string(),
            "nonce": authorization.nonce.to_string(),
        }
    });

    let (header, payload) = if required.x402_version >= 2 {
        let mut payload = json!({
            "x402Version": required.x402_version,
            "accepted": raw,
            "payload": exact,
        });
        if let Some(resource) = &required.resource {
            payload["resource"] = resource.clone();
        }
        (PAYMENT_SIGNATURE, payload)
    } else {
        let payload = json!({
            "x402Version": 1,
            "scheme": option.scheme,
            "network": option.network,
            "payload": exact,
        });
        (X_PAYMENT, payload)
    };

    let value = header::encode_base64_json(&payload).map_err(|e| PaymentError::Signing(e.to_string()))?;

    Ok(SignedPayment {
        header,
        value,
        payload,
        network: option.network,
        amount: option.amount,
    })
}

fn authorization(from: Address, option: &PaymentOption, now: u64) -> Result<TransferWithAuthorization, PaymentError> {
    let to: Address = option
        .pay_to
        .parse()
        .map_err(|_| PaymentError::Requirements(format!("invalid payTo address {}", option.pay_to)))?;
    let value = U256::from_str_radix(&option.amount, 10)
        .map_err(|_| PaymentError::Requirements(format!("invalid amount {}", option.amount)))?;

    let timeout = match option.max_timeout_seconds {
        0 => DEFAULT_TIMEOUT_SECS,
        secs => secs,
    };

    Ok(TransferWithAuthorization {
        from,
        to,
        value,
        validAfter: U256::from(now.saturating_sub(VALID_AFTER_SKEW_SECS)),
        validBefore: U256::from(now.saturating_add(timeout)),
        nonce: B256::random(),
    })
}

/// EIP-712 domain of the token contract being transferred.
fn domain(option: &PaymentOption, chain_id: u64) -> Result<Eip712Domain, PaymentError> {
    let asset: Address = option
        .asset
        .parse()
        .map_err(|_| PaymentError::Requirements(format!("invalid asset address {}", option.asset)))?;

    let extra = option.extra.clone().unwrap_or_default();
    let name = extra
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| PaymentError::Requirements("missing token domain name (extra.name)".into()))?;
    let version = extra
        .version
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_DOMAIN_VERSION.to_string());

    Ok(Eip712Domain::new(
        Some(name.into()),
        Some(version.into()),
        Some(U256::from(chain_id)),
        Some(asset),
        None,
    ))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
