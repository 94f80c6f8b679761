//! x402 probe and payment flow.
//!
//! A paid request happens in two phases:
//! 1. [`probe`]: send the request unauthenticated and classify the answer
//!    (free route, 402 Payment Required, or anything else).
//! 2. [`executor`]: resend it through a [`PaymentTransport`] that attaches a
//!    signed payment when the server asks for one, then classify the
//!    settlement.
//!
//! Signing lives behind [`PaymentBackend`]; [`exact::ExactEvmBackend`] is the
//! EIP-3009 implementation for EVM networks.

pub mod exact;
pub mod executor;
pub mod header;
pub mod probe;
pub mod target;
pub mod types;

pub use executor::{Executor, PaymentBackend, PaymentOutcome, PaymentTransport, SettlementClass};
pub use probe::{probe, ProbeClass, ProbeOutcome};
pub use target::{EndpointTarget, Reply};
pub use types::{PaymentOption, PaymentRequired, SettlementResponse};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    /// Request could not be built from user input
    #[error("invalid request: {0}")]
    InvalidTarget(String),

    /// DNS, TLS, connection or timeout failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// No signing credential was supplied
    #[error("signing credential is required")]
    MissingCredential,

    /// Credential is not valid key material
    #[error("failed to create signer: {0}")]
    Signer(String),

    /// 402 response without usable requirements
    #[error("invalid payment requirements: {0}")]
    Requirements(String),

    /// None of the accepted options can be paid by this backend
    #[error("no supported payment option: {0}")]
    Unsupported(String),

    /// Authorization could not be signed or encoded
    #[error("failed to sign payment: {0}")]
    Signing(String),
}
