//! Fungible token campaign.
//!
//! Each claim moves `claim_amount` of the issuer's tokens out of the allowance
//! the issuer granted the campaign: `claim_amount - referral_amount` to the
//! receiver and `referral_amount` to the referral the issuer bound into the
//! link signature. A link without a referral (the zero address) pays the full
//! `claim_amount` to the receiver.

use std::ops::Deref;

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::authorization::{self, IssuerBinding, LinkAuthorization};
use crate::campaign::{Campaign, ClaimReceipt, Deployment, Withdrawn};
use crate::error::LinkdropError;
use crate::ledger::{Asset, Transfer, ValueLedger};

/// Immutable parameters of a fungible token campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20CampaignConfig {
    /// Token contract the claims are paid in.
    pub token: Address,
    /// Token units per claim, referral share included.
    pub claim_amount: U256,
    /// Share of `claim_amount` paid to the referral.
    #[serde(default)]
    pub referral_amount: U256,
    /// Native currency paid to the relayer per claim.
    #[serde(default)]
    pub claim_amount_native: U256,
    /// Key that signs link keys.
    pub verification_address: Address,
}

/// A claim submitted by a relayer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Claim {
    /// Receiver named by the link holder.
    pub receiver: Address,
    /// Referral bound into the issuer signature; zero for none.
    #[serde(default)]
    pub referral: Address,
    /// Public identity of the link key.
    pub link_key: Address,
    /// Verification key's signature over `(link_key, referral)`.
    pub issuer_signature: Bytes,
    /// Link key's signature over `(receiver)`.
    pub receiver_signature: Bytes,
}

impl Erc20Claim {
    fn authorization(&self) -> LinkAuthorization<'_> {
        LinkAuthorization {
            link_key: self.link_key,
            binding: IssuerBinding::Referral(self.referral),
            receiver: self.receiver,
            issuer_signature: &self.issuer_signature,
            receiver_signature: &self.receiver_signature,
        }
    }
}

/// A fungible token campaign. Dereferences to the shared [`Campaign`] for
/// owner operations and queries.
#[derive(Debug)]
pub struct LinkdropErc20<L> {
    campaign: Campaign<L>,
    config: Erc20CampaignConfig,
}

impl<L: ValueLedger> LinkdropErc20<L> {
    /// Deploys a campaign on `ledger`.
    ///
    /// # Errors
    ///
    /// [`LinkdropError::InvalidConfig`] if `referral_amount > claim_amount`,
    /// the token or any deployment address is zero;
    /// [`LinkdropError::Funding`] if the initial deposit fails.
    pub async fn deploy(
        ledger: L,
        deployment: Deployment,
        config: Erc20CampaignConfig,
    ) -> Result<Self, LinkdropError> {
        if config.referral_amount > config.claim_amount {
            return Err(LinkdropError::InvalidConfig(format!(
                "referral amount {} exceeds claim amount {}",
                config.referral_amount, config.claim_amount
            )));
        }
        if config.token.is_zero() {
            return Err(LinkdropError::InvalidConfig(
                "token address is the zero address".into(),
            ));
        }
        let campaign = Campaign::deploy(
            ledger,
            deployment,
            config.verification_address,
            config.claim_amount_native,
        )
        .await?;
        Ok(Self { campaign, config })
    }

    /// Whether the verification key signed `(link_key, referral)`.
    #[must_use]
    pub fn verify_link_key(
        &self,
        link_key: Address,
        referral: Address,
        issuer_signature: &[u8],
    ) -> bool {
        authorization::verify_link_key(
            self.config.verification_address,
            link_key,
            referral,
            issuer_signature,
        )
    }

    /// Whether the key behind `link_key` signed `(receiver)`.
    #[must_use]
    pub fn verify_receiver_address(
        &self,
        link_key: Address,
        receiver: Address,
        receiver_signature: &[u8],
    ) -> bool {
        authorization::verify_receiver_address(link_key, receiver, receiver_signature)
    }

    /// Token units going to the receiver and to the referral for a claim
    /// bound to `referral`.
    #[must_use]
    pub fn split(&self, referral: Address) -> (U256, U256) {
        let claim_amount = self.config.claim_amount;
        let referral_amount = self.config.referral_amount;
        if referral.is_zero() || referral_amount.is_zero() {
            (claim_amount, U256::ZERO)
        } else {
            (claim_amount - referral_amount, referral_amount)
        }
    }

    /// Redeems a link on behalf of `caller`, the relayer.
    ///
    /// # Errors
    ///
    /// In order of evaluation: [`LinkdropError::Paused`],
    /// [`LinkdropError::LinkKeyNotSigned`], [`LinkdropError::ReceiverNotSigned`],
    /// [`LinkdropError::AlreadyClaimed`], [`LinkdropError::Funding`]. On any
    /// error nothing changed.
    pub async fn withdraw(
        &self,
        caller: Address,
        claim: &Erc20Claim,
    ) -> Result<ClaimReceipt, LinkdropError> {
        let (amount, referral_amount) = self.split(claim.referral);
        let issuer = self.campaign.issuer();
        let token = self.config.token;

        let mut transfers = Vec::with_capacity(3);
        if !amount.is_zero() {
            transfers.push(Transfer::Token {
                token,
                from: issuer,
                to: claim.receiver,
                amount,
            });
        }
        if !referral_amount.is_zero() {
            transfers.push(Transfer::Token {
                token,
                from: issuer,
                to: claim.referral,
                amount: referral_amount,
            });
        }

        let transfers = self
            .campaign
            .redeem(caller, &claim.authorization(), transfers)
            .await?;

        let event = Withdrawn {
            link_key: claim.link_key,
            receiver: claim.receiver,
            referral: claim.referral,
            token_id: None,
            amount,
            referral_amount,
            relayer: caller,
            native_rebate: self.campaign.claim_amount_native(),
        };
        Ok(ClaimReceipt { event, transfers })
    }

    /// Sends tokens stranded on the campaign's own balance to the owner.
    /// Allowed while paused.
    ///
    /// # Errors
    ///
    /// [`LinkdropError::NotOwner`] or [`LinkdropError::Funding`].
    pub async fn withdraw_tokens(&self, caller: Address) -> Result<U256, LinkdropError> {
        self.campaign
            .sweep(caller, Asset::Token(self.config.token))
            .await
    }
}

impl<L> LinkdropErc20<L> {
    /// Immutable campaign parameters.
    #[must_use]
    pub const fn config(&self) -> &Erc20CampaignConfig {
        &self.config
    }
}

impl<L> Deref for LinkdropErc20<L> {
    type Target = Campaign<L>;

    fn deref(&self) -> &Self::Target {
        &self.campaign
    }
}
