//! Contract bindings for all external contracts.
//!
//! This crate consolidates the Solidity interfaces used across the project:
//! - ERC20 tokens (balance queries)
//! - EIP-3009 transfer authorizations (x402 exact payments)
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod eip3009;
pub mod token;
