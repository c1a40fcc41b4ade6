//! Off-chain signing helpers for tests, mirroring what campaign tooling does.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

use crate::ledger::{Asset, InMemoryLedger, LedgerError, Transfer, ValueLedger};
use crate::signature::{link_key_message, link_key_message_simple, receiver_message};

/// Deterministic signer derived from a non-zero seed byte.
pub fn signer(seed: u8) -> PrivateKeySigner {
    PrivateKeySigner::from_bytes(&B256::repeat_byte(seed)).expect("valid secret key")
}

/// Signs `message` as an EIP-191 personal message and returns `r ‖ s ‖ v`.
pub fn sign(key: &PrivateKeySigner, message: B256) -> Bytes {
    let signature = key
        .sign_message_sync(message.as_slice())
        .expect("signing succeeds");
    Bytes::copy_from_slice(&signature.as_bytes())
}

/// Returns a copy of `bytes` with the byte at `index` altered.
pub fn flip_byte(bytes: &[u8], index: usize) -> Vec<u8> {
    let mut out = bytes.to_vec();
    out[index] ^= 0x01;
    out
}

/// A freshly created link: its ephemeral key and the issuer's signature.
pub struct Link {
    pub key: PrivateKeySigner,
    pub issuer_signature: Bytes,
}

impl Link {
    /// Link bound to `referral` (fungible campaigns).
    pub fn new(verifier: &PrivateKeySigner, seed: u8, referral: Address) -> Self {
        let key = signer(seed);
        let issuer_signature = sign(verifier, link_key_message(key.address(), referral));
        Self {
            key,
            issuer_signature,
        }
    }

    /// Link bound to nothing but its key (registry campaigns).
    pub fn simple(verifier: &PrivateKeySigner, seed: u8) -> Self {
        let key = signer(seed);
        let issuer_signature = sign(verifier, link_key_message_simple(key.address()));
        Self {
            key,
            issuer_signature,
        }
    }

    pub fn address(&self) -> Address {
        self.key.address()
    }

    /// Receiver signature produced with the link's private key.
    pub fn sign_receiver(&self, receiver: Address) -> Bytes {
        sign(&self.key, receiver_message(receiver))
    }
}

pub fn amount(value: u64) -> U256 {
    U256::from(value)
}

/// Host ledger stand-in over an [`InMemoryLedger`]: can be taken offline, and
/// can keep a batch pending for `settle` after committing it, like a node
/// waiting for confirmation.
#[derive(Debug)]
pub struct RemoteLedger {
    inner: Arc<InMemoryLedger>,
    offline: AtomicBool,
    settle: Duration,
}

impl RemoteLedger {
    pub fn new(inner: Arc<InMemoryLedger>, settle: Duration) -> Self {
        Self {
            inner,
            offline: AtomicBool::new(false),
            settle,
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl ValueLedger for RemoteLedger {
    async fn balance_of(&self, asset: Asset, holder: Address) -> Result<U256, LedgerError> {
        self.inner.balance_of(asset, holder).await
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, LedgerError> {
        self.inner.allowance(token, owner, spender).await
    }

    async fn owner_of(&self, registry: Address, token_id: U256) -> Result<Address, LedgerError> {
        self.inner.owner_of(registry, token_id).await
    }

    async fn execute(&self, spender: Address, transfers: &[Transfer]) -> Result<(), LedgerError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("connection refused".into()));
        }
        self.inner.execute(spender, transfers).await?;
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        Ok(())
    }
}
