//! x402-cli: exercise pay-per-request HTTP endpoints and inspect the paying
//! wallet.

pub mod cli;
pub mod confirm;
pub mod output;
pub mod run;
pub mod wallet;

use balance::BalanceError;
use payment::PaymentError;
use thiserror::Error;

/// Reported in the banner and `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the signing key.
pub const CREDENTIAL_ENV: &str = "EVM_PRIVATE_KEY";

#[derive(Error, Debug)]
pub enum RunError {
    #[error("URL argument is required")]
    MissingUrl,

    #[error("EVM_PRIVATE_KEY is required for Step 2 (payment)")]
    MissingPaymentCredential,

    #[error("EVM_PRIVATE_KEY is required")]
    MissingCredential,

    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Transport or negotiation failure during the paid request
    #[error("payment request failed: {0}")]
    PaymentRequest(#[source] PaymentError),

    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),

    #[error("failed to read confirmation: {0}")]
    Confirmation(#[from] std::io::Error),

    #[error(transparent)]
    Balance(#[from] BalanceError),
}

impl RunError {
    /// Remediation shown under the error in text mode.
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingPaymentCredential | Self::MissingCredential => {
                Some("Set it with: export EVM_PRIVATE_KEY=0x...")
            }
            _ => None,
        }
    }
}
