//! Error types for campaign operations.
//!
//! Every failure of a state-mutating operation leaves the campaign exactly as
//! it was before the call. [`ErrorKind`] groups the variants into the four
//! categories a relay has to tell apart, plus configuration errors raised at
//! construction.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// Errors returned by campaign construction, claims and owner operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LinkdropError {
    /// The issuer's signature over the link key does not recover to the
    /// campaign's verification address.
    #[error("Link key is not signed by linkdrop verification key")]
    LinkKeyNotSigned,
    /// The receiver signature does not recover to the link key.
    #[error("Receiver address is not signed by link key")]
    ReceiverNotSigned,
    /// The link key has been redeemed before.
    #[error("Link key {0} has already been used")]
    AlreadyClaimed(Address),
    /// The campaign is paused.
    #[error("Campaign is paused")]
    Paused,
    /// Unpause was requested while the campaign is active.
    #[error("Campaign is not paused")]
    NotPaused,
    /// The caller is not the campaign owner.
    #[error("Caller is not the owner")]
    NotOwner,
    /// Ownership cannot be handed to the zero address.
    #[error("New owner is the zero address")]
    ZeroOwner,
    /// The value ledger refused the transfer batch.
    #[error(transparent)]
    Funding(#[from] LedgerError),
    /// Construction parameters are inconsistent.
    #[error("Invalid campaign configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse failure category of a [`LinkdropError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A signature chain does not verify. Only a correctly signed link helps.
    Authorization,
    /// The link was already redeemed. Permanent.
    Replay,
    /// Paused, or an owner-only operation called by someone else.
    Guard,
    /// The ledger could not move the funds. Retryable once funded.
    Funding,
    /// The campaign was constructed with invalid parameters.
    Configuration,
}

impl LinkdropError {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::LinkKeyNotSigned | Self::ReceiverNotSigned => ErrorKind::Authorization,
            Self::AlreadyClaimed(_) => ErrorKind::Replay,
            Self::Paused | Self::NotPaused | Self::NotOwner | Self::ZeroOwner => ErrorKind::Guard,
            Self::Funding(_) => ErrorKind::Funding,
            Self::InvalidConfig(_) => ErrorKind::Configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Asset;

    #[test]
    fn test_kinds_are_distinct_per_category() {
        assert_eq!(LinkdropError::LinkKeyNotSigned.kind(), ErrorKind::Authorization);
        assert_eq!(LinkdropError::ReceiverNotSigned.kind(), ErrorKind::Authorization);
        assert_eq!(
            LinkdropError::AlreadyClaimed(Address::ZERO).kind(),
            ErrorKind::Replay
        );
        assert_eq!(LinkdropError::Paused.kind(), ErrorKind::Guard);
        assert_eq!(LinkdropError::NotOwner.kind(), ErrorKind::Guard);
        let funding = LinkdropError::from(LedgerError::InsufficientBalance {
            asset: Asset::Native,
            holder: Address::ZERO,
        });
        assert_eq!(funding.kind(), ErrorKind::Funding);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::Authorization).unwrap();
        assert_eq!(json, "\"authorization\"");
    }

    #[test]
    fn test_messages_are_human_readable() {
        assert_eq!(
            LinkdropError::LinkKeyNotSigned.to_string(),
            "Link key is not signed by linkdrop verification key"
        );
        assert_eq!(
            LinkdropError::ReceiverNotSigned.to_string(),
            "Receiver address is not signed by link key"
        );
    }
}
