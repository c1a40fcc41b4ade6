//! Owner and pause guard.
//!
//! [`AccessState`] is a two-state machine (active / paused) plus a single
//! owner. Transitions are owner-only and strict: pausing a paused campaign
//! or unpausing an active one is an error, never a silent no-op.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::LinkdropError;

/// Ownership and pause flag of one campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessState {
    owner: Address,
    paused: bool,
}

impl AccessState {
    /// Active state owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkdropError::ZeroOwner`] if `owner` is the zero address.
    pub fn new(owner: Address) -> Result<Self, LinkdropError> {
        if owner.is_zero() {
            return Err(LinkdropError::ZeroOwner);
        }
        Ok(Self {
            owner,
            paused: false,
        })
    }

    /// Current owner.
    #[must_use]
    pub const fn owner(&self) -> Address {
        self.owner
    }

    /// Whether the campaign is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fails unless `caller` is the owner.
    ///
    /// # Errors
    ///
    /// Returns [`LinkdropError::NotOwner`].
    pub fn ensure_owner(&self, caller: Address) -> Result<(), LinkdropError> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(LinkdropError::NotOwner)
        }
    }

    /// Fails if the campaign is paused.
    ///
    /// # Errors
    ///
    /// Returns [`LinkdropError::Paused`].
    pub fn ensure_active(&self) -> Result<(), LinkdropError> {
        if self.paused {
            Err(LinkdropError::Paused)
        } else {
            Ok(())
        }
    }

    /// Moves from active to paused.
    ///
    /// # Errors
    ///
    /// [`LinkdropError::NotOwner`] for anyone but the owner,
    /// [`LinkdropError::Paused`] if already paused.
    pub fn pause(&mut self, caller: Address) -> Result<(), LinkdropError> {
        self.ensure_owner(caller)?;
        self.ensure_active()?;
        self.paused = true;
        Ok(())
    }

    /// Moves from paused to active.
    ///
    /// # Errors
    ///
    /// [`LinkdropError::NotOwner`] for anyone but the owner,
    /// [`LinkdropError::NotPaused`] if not paused.
    pub fn unpause(&mut self, caller: Address) -> Result<(), LinkdropError> {
        self.ensure_owner(caller)?;
        if !self.paused {
            return Err(LinkdropError::NotPaused);
        }
        self.paused = false;
        Ok(())
    }

    /// Hands ownership to `new_owner`. Allowed while paused.
    ///
    /// # Errors
    ///
    /// [`LinkdropError::NotOwner`] for anyone but the owner,
    /// [`LinkdropError::ZeroOwner`] if `new_owner` is the zero address.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), LinkdropError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(LinkdropError::ZeroOwner);
        }
        self.owner = new_owner;
        Ok(())
    }
}
