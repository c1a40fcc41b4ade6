//! External value ledger interface.
//!
//! A campaign never holds balances itself. It asks a [`ValueLedger`] for
//! balances and hands it batches of [`Transfer`]s to apply. Implementations
//! must apply a batch all-or-nothing: either every transfer lands or the
//! ledger is left untouched and an error is returned. This is what lets a
//! failed claim roll back without burning its link.
//!
//! [`InMemoryLedger`] is a complete implementation used by tests and by the
//! relay's standalone mode.

mod memory;

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use memory::InMemoryLedger;

/// A fungible balance a ledger tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    /// The chain's native currency.
    Native,
    /// A fungible token contract.
    Token(Address),
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Token(address) => write!(f, "token {address}"),
        }
    }
}

/// A single value movement inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transfer {
    /// `transferFrom(from, to, amount)` on a fungible token.
    Token {
        /// Token contract.
        token: Address,
        /// Holder debited.
        from: Address,
        /// Holder credited.
        to: Address,
        /// Token units.
        amount: U256,
    },
    /// `transferFrom(from, to, token_id)` on an ownership registry.
    Nft {
        /// Registry contract.
        registry: Address,
        /// Current owner.
        from: Address,
        /// New owner.
        to: Address,
        /// Token identifier.
        token_id: U256,
    },
    /// Native currency sent by `from`, which must be the batch's spender.
    Native {
        /// Sender.
        from: Address,
        /// Recipient.
        to: Address,
        /// Amount in the smallest native unit.
        amount: U256,
    },
}

/// Reasons a ledger refuses a query or a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LedgerError {
    /// `holder` does not have enough of `asset`.
    #[error("Insufficient {asset} balance of {holder}")]
    InsufficientBalance {
        /// Asset that ran short.
        asset: Asset,
        /// Holder that was debited.
        holder: Address,
    },
    /// `spender` may not move that much of `owner`'s tokens.
    #[error("Insufficient allowance of {spender} on token {token} held by {owner}")]
    InsufficientAllowance {
        /// Token contract.
        token: Address,
        /// Token holder.
        owner: Address,
        /// Party spending on the holder's behalf.
        spender: Address,
    },
    /// The registry has no such token.
    #[error("Token {token_id} does not exist in registry {registry}")]
    NonexistentToken {
        /// Registry contract.
        registry: Address,
        /// Token identifier.
        token_id: U256,
    },
    /// The token is not owned by the transfer's `from`.
    #[error("Token {token_id} of registry {registry} is not owned by {from}")]
    NotTokenOwner {
        /// Registry contract.
        registry: Address,
        /// Token identifier.
        token_id: U256,
        /// Claimed owner.
        from: Address,
    },
    /// The spender is neither owner, approved address nor operator.
    #[error("{spender} is not approved to move token {token_id} of registry {registry}")]
    NotApproved {
        /// Registry contract.
        registry: Address,
        /// Token identifier.
        token_id: U256,
        /// Party attempting the transfer.
        spender: Address,
    },
    /// Native currency can only be sent by its holder.
    #[error("{spender} cannot send native currency on behalf of {holder}")]
    ForeignNativeTransfer {
        /// Holder debited.
        holder: Address,
        /// Party that initiated the batch.
        spender: Address,
    },
    /// A credit would exceed the balance type.
    #[error("Balance overflow")]
    Overflow,
    /// The ledger could not be reached or answered with an error.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Balance queries and atomic transfer batches on the host ledger.
#[async_trait]
pub trait ValueLedger: Send + Sync {
    /// Balance of `holder` in `asset`.
    async fn balance_of(&self, asset: Asset, holder: Address) -> Result<U256, LedgerError>;

    /// Amount of `token` that `spender` may move out of `owner`'s balance.
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, LedgerError>;

    /// Current owner of `token_id` in `registry`.
    async fn owner_of(&self, registry: Address, token_id: U256) -> Result<Address, LedgerError>;

    /// Applies `transfers` on behalf of `spender`, all or nothing.
    async fn execute(&self, spender: Address, transfers: &[Transfer]) -> Result<(), LedgerError>;
}

#[async_trait]
impl<L> ValueLedger for Arc<L>
where
    L: ValueLedger + ?Sized,
{
    async fn balance_of(&self, asset: Asset, holder: Address) -> Result<U256, LedgerError> {
        (**self).balance_of(asset, holder).await
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, LedgerError> {
        (**self).allowance(token, owner, spender).await
    }

    async fn owner_of(&self, registry: Address, token_id: U256) -> Result<Address, LedgerError> {
        (**self).owner_of(registry, token_id).await
    }

    async fn execute(&self, spender: Address, transfers: &[Transfer]) -> Result<(), LedgerError> {
        (**self).execute(spender, transfers).await
    }
}
