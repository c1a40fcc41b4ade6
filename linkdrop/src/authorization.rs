//! The two signature chains a claim has to satisfy.
//!
//! 1. The issuer's verification key vouches for the link key (and, for
//!    fungible campaigns, the referral bound to it), so a relay cannot alter
//!    referral attribution after signing.
//! 2. The link key vouches for the receiver, so a relay cannot redirect the
//!    funds to a different receiver than the link holder chose.
//!
//! Both predicates are pure functions of caller-supplied data.

use alloy_primitives::Address;

use crate::error::LinkdropError;
use crate::signature::{
    link_key_message, link_key_message_simple, receiver_message, verify_signature,
};

/// Returns `true` iff `verification_address` signed `(link_key, referral)`.
#[must_use]
pub fn verify_link_key(
    verification_address: Address,
    link_key: Address,
    referral: Address,
    issuer_signature: &[u8],
) -> bool {
    verify_signature(
        link_key_message(link_key, referral),
        issuer_signature,
        verification_address,
    )
}

/// Returns `true` iff `verification_address` signed `(link_key)` alone.
#[must_use]
pub fn verify_link_key_simple(
    verification_address: Address,
    link_key: Address,
    issuer_signature: &[u8],
) -> bool {
    verify_signature(
        link_key_message_simple(link_key),
        issuer_signature,
        verification_address,
    )
}

/// Returns `true` iff the key behind `link_key` signed `(receiver)`.
#[must_use]
pub fn verify_receiver_address(
    link_key: Address,
    receiver: Address,
    receiver_signature: &[u8],
) -> bool {
    verify_signature(receiver_message(receiver), receiver_signature, link_key)
}

/// What the issuer's signature covers besides the link key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuerBinding {
    /// `(link_key, referral)`; the zero address stands for "no referral".
    Referral(Address),
    /// `(link_key)` only.
    KeyOnly,
}

/// A claim's signatures together with the fields they cover.
#[derive(Debug, Clone, Copy)]
pub struct LinkAuthorization<'a> {
    /// Public identity of the link's ephemeral key.
    pub link_key: Address,
    /// Fields bound into the issuer signature.
    pub binding: IssuerBinding,
    /// Receiver the link holder chose.
    pub receiver: Address,
    /// Verification key's signature over the link key.
    pub issuer_signature: &'a [u8],
    /// Link key's signature over the receiver.
    pub receiver_signature: &'a [u8],
}

impl LinkAuthorization<'_> {
    /// Whether the issuer chain verifies against `verification_address`.
    #[must_use]
    pub fn link_key_verified(&self, verification_address: Address) -> bool {
        match self.binding {
            IssuerBinding::Referral(referral) => verify_link_key(
                verification_address,
                self.link_key,
                referral,
                self.issuer_signature,
            ),
            IssuerBinding::KeyOnly => {
                verify_link_key_simple(verification_address, self.link_key, self.issuer_signature)
            }
        }
    }

    /// Whether the receiver chain verifies.
    #[must_use]
    pub fn receiver_verified(&self) -> bool {
        verify_receiver_address(self.link_key, self.receiver, self.receiver_signature)
    }

    /// Checks the issuer chain, then the receiver chain.
    ///
    /// # Errors
    ///
    /// [`LinkdropError::LinkKeyNotSigned`] or [`LinkdropError::ReceiverNotSigned`].
    pub fn authorize(&self, verification_address: Address) -> Result<(), LinkdropError> {
        if !self.link_key_verified(verification_address) {
            return Err(LinkdropError::LinkKeyNotSigned);
        }
        if !self.receiver_verified() {
            return Err(LinkdropError::ReceiverNotSigned);
        }
        Ok(())
    }
}
