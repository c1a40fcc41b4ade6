#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Claim authorization and replay protection for one-time claim links.
//!
//! An issuer funds a campaign and authorizes a *verification key* to co-sign
//! ephemeral per-link keys. Whoever holds a link's private key proves it by
//! signing the receiver address, and a relay submits both signatures so the
//! receiver never needs native currency to redeem.
//!
//! # Modules
//!
//! - [`signature`] - Message layout and signer recovery (the wire contract)
//! - [`authorization`] - The two signature chains a claim must satisfy
//! - [`claims`] - One-time claim ledger
//! - [`access`] - Owner and pause guard
//! - [`ledger`] - External value ledger interface and an in-memory ledger
//! - [`campaign`] - State and records shared by both campaign variants
//! - [`erc20`] - Fungible token campaign with referral split
//! - [`erc721`] - Ownership registry (NFT) campaign
//! - [`error`] - Error taxonomy
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation of campaign operations

pub mod access;
pub mod authorization;
pub mod campaign;
pub mod claims;
pub mod erc20;
pub mod erc721;
pub mod error;
pub mod ledger;
pub mod signature;

#[cfg(test)]
pub(crate) mod test_support;

pub use campaign::{ClaimReceipt, Deployment, Withdrawn};
pub use erc20::{Erc20CampaignConfig, Erc20Claim, LinkdropErc20};
pub use erc721::{Erc721CampaignConfig, Erc721Claim, LinkdropErc721};
pub use error::{ErrorKind, LinkdropError};
pub use ledger::{Asset, InMemoryLedger, LedgerError, Transfer, ValueLedger};
