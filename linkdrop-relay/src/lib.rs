//! HTTP relay for one-time claim links.
//!
//! Receivers hand their signed claim to the relay, which submits it to the
//! campaign and collects the native rebate. The relay runs over an in-memory
//! value ledger seeded from its configuration.
//!
//! # Modules
//!
//! - [`handlers`] - Axum route handlers and router builder
//! - [`relay`] - Claim submission and campaign queries
//! - [`error`] - Relay error types and their HTTP mapping
//! - [`config`] - Server configuration with environment variable expansion

pub mod config;
pub mod error;
pub mod handlers;
pub mod relay;

pub use handlers::{RelayState, relay_router};
pub use relay::{CampaignHandle, ClaimRequest, Relay};
