//! One-time claim ledger.
//!
//! The ledger is the sole replay protection. A link key is recorded before its
//! transfers are submitted and is removed again only when the value ledger
//! rejected that batch. It holds no other state and is only ever mutated from
//! inside a campaign's critical section.

use std::collections::HashSet;

use alloy_primitives::Address;

use crate::error::LinkdropError;

/// Sparse set of link keys that have been redeemed.
#[derive(Debug, Default, Clone)]
pub struct ClaimLedger {
    claimed: HashSet<Address>,
}

impl ClaimLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `link_key` has been redeemed.
    #[must_use]
    pub fn is_claimed(&self, link_key: &Address) -> bool {
        self.claimed.contains(link_key)
    }

    /// Fails if `link_key` was already redeemed, without recording anything.
    ///
    /// # Errors
    ///
    /// Returns [`LinkdropError::AlreadyClaimed`].
    pub fn ensure_unclaimed(&self, link_key: Address) -> Result<(), LinkdropError> {
        if self.is_claimed(&link_key) {
            Err(LinkdropError::AlreadyClaimed(link_key))
        } else {
            Ok(())
        }
    }

    /// Records `link_key` as redeemed.
    ///
    /// # Errors
    ///
    /// Returns [`LinkdropError::AlreadyClaimed`] if it already was; the ledger
    /// is unchanged in that case.
    pub fn check_and_set(&mut self, link_key: Address) -> Result<(), LinkdropError> {
        if self.claimed.insert(link_key) {
            Ok(())
        } else {
            Err(LinkdropError::AlreadyClaimed(link_key))
        }
    }

    /// Forgets a reservation made by [`check_and_set`](Self::check_and_set)
    /// whose transfer batch the value ledger refused.
    pub(crate) fn release(&mut self, link_key: &Address) {
        self.claimed.remove(link_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_and_set_succeeds_once() {
        let key = Address::repeat_byte(0x42);
        let mut ledger = ClaimLedger::new();
        assert!(ledger.ensure_unclaimed(key).is_ok());
        ledger.check_and_set(key).unwrap();
        assert!(ledger.is_claimed(&key));
        assert_eq!(
            ledger.check_and_set(key),
            Err(LinkdropError::AlreadyClaimed(key))
        );
        assert_eq!(
            ledger.ensure_unclaimed(key),
            Err(LinkdropError::AlreadyClaimed(key))
        );
    }

    #[test]
    fn test_keys_are_independent() {
        let mut ledger = ClaimLedger::new();
        ledger.check_and_set(Address::repeat_byte(1)).unwrap();
        assert!(!ledger.is_claimed(&Address::repeat_byte(2)));
        ledger.check_and_set(Address::repeat_byte(2)).unwrap();
        assert!(ledger.is_claimed(&Address::repeat_byte(1)));
    }

    #[test]
    fn test_release_reopens_only_that_key() {
        let first = Address::repeat_byte(1);
        let second = Address::repeat_byte(2);
        let mut ledger = ClaimLedger::new();
        ledger.check_and_set(first).unwrap();
        ledger.check_and_set(second).unwrap();

        ledger.release(&first);
        assert!(!ledger.is_claimed(&first));
        assert!(ledger.is_claimed(&second));
        ledger.check_and_set(first).unwrap();
    }
}
