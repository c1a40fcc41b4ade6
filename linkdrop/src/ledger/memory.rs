//! In-memory value ledger.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Asset, LedgerError, Transfer, ValueLedger};

#[derive(Debug, Default, Clone)]
struct Books {
    balances: HashMap<(Asset, Address), U256>,
    /// `(token, owner, spender) → remaining allowance`
    allowances: HashMap<(Address, Address, Address), U256>,
    /// `(registry, token_id) → owner`
    owners: HashMap<(Address, U256), Address>,
    /// `(registry, token_id) → approved address`
    token_approvals: HashMap<(Address, U256), Address>,
    /// `(registry, owner, operator)`
    operators: HashSet<(Address, Address, Address)>,
}

impl Books {
    fn balance(&self, asset: Asset, holder: Address) -> U256 {
        self.balances
            .get(&(asset, holder))
            .copied()
            .unwrap_or_default()
    }

    fn debit(&mut self, asset: Asset, holder: Address, amount: U256) -> Result<(), LedgerError> {
        let balance = self.balance(asset, holder);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance { asset, holder })?;
        self.balances.insert((asset, holder), remaining);
        Ok(())
    }

    fn credit(&mut self, asset: Asset, holder: Address, amount: U256) -> Result<(), LedgerError> {
        let balance = self.balance(asset, holder);
        let updated = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.balances.insert((asset, holder), updated);
        Ok(())
    }

    fn spend_allowance(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        if owner == spender {
            return Ok(());
        }
        let key = (token, owner, spender);
        let allowance = self.allowances.get(&key).copied().unwrap_or_default();
        let remaining = allowance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientAllowance {
                token,
                owner,
                spender,
            })?;
        self.allowances.insert(key, remaining);
        Ok(())
    }

    fn apply(&mut self, spender: Address, transfer: &Transfer) -> Result<(), LedgerError> {
        match *transfer {
            Transfer::Token {
                token,
                from,
                to,
                amount,
            } => {
                self.spend_allowance(token, from, spender, amount)?;
                self.debit(Asset::Token(token), from, amount)?;
                self.credit(Asset::Token(token), to, amount)?;
            }
            Transfer::Nft {
                registry,
                from,
                to,
                token_id,
            } => {
                let owner = *self
                    .owners
                    .get(&(registry, token_id))
                    .ok_or(LedgerError::NonexistentToken { registry, token_id })?;
                if owner != from {
                    return Err(LedgerError::NotTokenOwner {
                        registry,
                        token_id,
                        from,
                    });
                }
                let approved = spender == owner
                    || self.token_approvals.get(&(registry, token_id)) == Some(&spender)
                    || self.operators.contains(&(registry, owner, spender));
                if !approved {
                    return Err(LedgerError::NotApproved {
                        registry,
                        token_id,
                        spender,
                    });
                }
                self.token_approvals.remove(&(registry, token_id));
                self.owners.insert((registry, token_id), to);
            }
            Transfer::Native { from, to, amount } => {
                if from != spender {
                    return Err(LedgerError::ForeignNativeTransfer {
                        holder: from,
                        spender,
                    });
                }
                self.debit(Asset::Native, from, amount)?;
                self.credit(Asset::Native, to, amount)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    books: Books,
    /// Committed transfers in order. Not part of the copied books.
    journal: Vec<Transfer>,
}

/// A [`ValueLedger`] kept entirely in process memory.
///
/// Batches are applied to a copy of the books which replaces the live books
/// only when every transfer succeeded.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amount` of `asset` to `holder` out of thin air.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if the balance would overflow.
    pub async fn mint(&self, asset: Asset, holder: Address, amount: U256) -> Result<(), LedgerError> {
        self.state.lock().await.books.credit(asset, holder, amount)
    }

    /// Sets the allowance `owner` grants `spender` on `token`.
    pub async fn approve(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state
            .lock()
            .await
            .books
            .allowances
            .insert((token, owner, spender), amount);
    }

    /// Creates `token_id` in `registry`, owned by `owner`. Replaces any
    /// previous owner.
    pub async fn mint_nft(&self, registry: Address, owner: Address, token_id: U256) {
        self.state
            .lock()
            .await
            .books
            .owners
            .insert((registry, token_id), owner);
    }

    /// Approves `spender` for a single token.
    pub async fn approve_nft(&self, registry: Address, spender: Address, token_id: U256) {
        self.state
            .lock()
            .await
            .books
            .token_approvals
            .insert((registry, token_id), spender);
    }

    /// Grants or revokes `operator` control over every token `owner` holds in
    /// `registry`.
    pub async fn set_approval_for_all(
        &self,
        registry: Address,
        owner: Address,
        operator: Address,
        approved: bool,
    ) {
        let mut state = self.state.lock().await;
        if approved {
            state.books.operators.insert((registry, owner, operator));
        } else {
            state.books.operators.remove(&(registry, owner, operator));
        }
    }

    /// Every transfer applied so far, in order.
    pub async fn journal(&self) -> Vec<Transfer> {
        self.state.lock().await.journal.clone()
    }
}

#[async_trait]
impl ValueLedger for InMemoryLedger {
    async fn balance_of(&self, asset: Asset, holder: Address) -> Result<U256, LedgerError> {
        Ok(self.state.lock().await.books.balance(asset, holder))
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, LedgerError> {
        Ok(self
            .state
            .lock()
            .await
            .books
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn owner_of(&self, registry: Address, token_id: U256) -> Result<Address, LedgerError> {
        self.state
            .lock()
            .await
            .books
            .owners
            .get(&(registry, token_id))
            .copied()
            .ok_or(LedgerError::NonexistentToken { registry, token_id })
    }

    async fn execute(&self, spender: Address, transfers: &[Transfer]) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        let mut pending = state.books.clone();
        for transfer in transfers {
            pending.apply(spender, transfer)?;
        }
        state.books = pending;
        state.journal.extend_from_slice(transfers);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: Address = Address::repeat_byte(0x70);
    const REGISTRY: Address = Address::repeat_byte(0x72);
    const ALICE: Address = Address::repeat_byte(0xA1);
    const BOB: Address = Address::repeat_byte(0xB0);
    const SPENDER: Address = Address::repeat_byte(0x5E);

    fn token(from: Address, to: Address, amount: u64) -> Transfer {
        Transfer::Token {
            token: TOKEN,
            from,
            to,
            amount: U256::from(amount),
        }
    }

    #[tokio::test]
    async fn test_transfer_from_consumes_allowance() {
        let ledger = InMemoryLedger::new();
        ledger
            .mint(Asset::Token(TOKEN), ALICE, U256::from(100))
            .await
            .unwrap();
        ledger.approve(TOKEN, ALICE, SPENDER, U256::from(30)).await;

        ledger
            .execute(SPENDER, &[token(ALICE, BOB, 20)])
            .await
            .unwrap();

        assert_eq!(
            ledger.balance_of(Asset::Token(TOKEN), BOB).await.unwrap(),
            U256::from(20)
        );
        assert_eq!(
            ledger.allowance(TOKEN, ALICE, SPENDER).await.unwrap(),
            U256::from(10)
        );
        let err = ledger
            .execute(SPENDER, &[token(ALICE, BOB, 11)])
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientAllowance { .. }));
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_books_untouched() {
        let ledger = InMemoryLedger::new();
        ledger
            .mint(Asset::Token(TOKEN), ALICE, U256::from(5))
            .await
            .unwrap();
        ledger.approve(TOKEN, ALICE, SPENDER, U256::from(100)).await;

        let err = ledger
            .execute(SPENDER, &[token(ALICE, BOB, 4), token(ALICE, BOB, 4)])
            .await
            .unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                asset: Asset::Token(TOKEN),
                holder: ALICE
            }
        );
        assert_eq!(
            ledger.balance_of(Asset::Token(TOKEN), ALICE).await.unwrap(),
            U256::from(5)
        );
        assert_eq!(
            ledger.balance_of(Asset::Token(TOKEN), BOB).await.unwrap(),
            U256::ZERO
        );
        assert_eq!(
            ledger.allowance(TOKEN, ALICE, SPENDER).await.unwrap(),
            U256::from(100)
        );
        assert!(ledger.journal().await.is_empty());
    }

    #[tokio::test]
    async fn test_nft_requires_operator_or_token_approval() {
        let ledger = InMemoryLedger::new();
        let id = U256::from(7);
        ledger.mint_nft(REGISTRY, ALICE, id).await;
        let transfer = Transfer::Nft {
            registry: REGISTRY,
            from: ALICE,
            to: BOB,
            token_id: id,
        };

        let err = ledger
            .execute(SPENDER, std::slice::from_ref(&transfer))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotApproved { .. }));

        ledger.approve_nft(REGISTRY, SPENDER, id).await;
        ledger
            .execute(SPENDER, std::slice::from_ref(&transfer))
            .await
            .unwrap();
        assert_eq!(ledger.owner_of(REGISTRY, id).await.unwrap(), BOB);

        // approval is cleared on transfer
        let back = Transfer::Nft {
            registry: REGISTRY,
            from: BOB,
            to: ALICE,
            token_id: id,
        };
        assert!(ledger.execute(SPENDER, &[back.clone()]).await.is_err());
        ledger
            .set_approval_for_all(REGISTRY, BOB, SPENDER, true)
            .await;
        ledger.execute(SPENDER, &[back]).await.unwrap();
        assert_eq!(ledger.owner_of(REGISTRY, id).await.unwrap(), ALICE);
    }

    #[tokio::test]
    async fn test_native_only_spendable_by_holder() {
        let ledger = InMemoryLedger::new();
        ledger
            .mint(Asset::Native, ALICE, U256::from(10))
            .await
            .unwrap();
        let transfer = Transfer::Native {
            from: ALICE,
            to: BOB,
            amount: U256::from(3),
        };
        let err = ledger
            .execute(SPENDER, std::slice::from_ref(&transfer))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ForeignNativeTransfer { .. }));

        ledger.execute(ALICE, &[transfer]).await.unwrap();
        assert_eq!(
            ledger.balance_of(Asset::Native, BOB).await.unwrap(),
            U256::from(3)
        );
        assert_eq!(ledger.journal().await.len(), 1);
    }

    #[tokio::test]
    async fn test_journal_records_each_committed_batch_once() {
        let ledger = InMemoryLedger::new();
        ledger
            .mint(Asset::Token(TOKEN), ALICE, U256::from(10))
            .await
            .unwrap();
        ledger.approve(TOKEN, ALICE, SPENDER, U256::from(10)).await;

        let first = [token(ALICE, BOB, 2), token(ALICE, SPENDER, 1)];
        ledger.execute(SPENDER, &first).await.unwrap();
        assert_eq!(ledger.journal().await, first.to_vec());

        assert!(
            ledger
                .execute(SPENDER, &[token(ALICE, BOB, 3), token(ALICE, BOB, 50)])
                .await
                .is_err()
        );
        assert_eq!(ledger.journal().await.len(), 2);

        ledger
            .execute(SPENDER, &[token(ALICE, BOB, 4)])
            .await
            .unwrap();
        let journal = ledger.journal().await;
        assert_eq!(journal.len(), 3);
        assert_eq!(journal[2], token(ALICE, BOB, 4));
        assert_eq!(journal[..2], first);
    }

    #[tokio::test]
    async fn test_unknown_token_owner_query_fails() {
        let ledger = InMemoryLedger::new();
        let err = ledger.owner_of(REGISTRY, U256::from(1)).await.unwrap_err();
        assert!(matches!(err, LedgerError::NonexistentToken { .. }));
    }
}
