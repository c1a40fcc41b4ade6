//! Ownership registry (NFT) campaign.
//!
//! Each claim moves one token of the issuer's to the receiver. The issuer
//! grants the campaign operator rights on the registry beforehand. Links bind
//! only the link key; there is no referral share.

use std::ops::Deref;

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::authorization::{self, IssuerBinding, LinkAuthorization};
use crate::campaign::{Campaign, ClaimReceipt, Deployment, Withdrawn};
use crate::error::LinkdropError;
use crate::ledger::{Transfer, ValueLedger};

/// Immutable parameters of a registry campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc721CampaignConfig {
    /// Registry contract the tokens live in.
    pub registry: Address,
    /// Native currency paid to the relayer per claim.
    #[serde(default)]
    pub claim_amount_native: U256,
    /// Key that signs link keys.
    pub verification_address: Address,
}

/// A claim submitted by a relayer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc721Claim {
    /// Receiver named by the link holder.
    pub receiver: Address,
    /// Token handed out by this link.
    pub token_id: U256,
    /// Public identity of the link key.
    pub link_key: Address,
    /// Verification key's signature over `(link_key)`.
    pub issuer_signature: Bytes,
    /// Link key's signature over `(receiver)`.
    pub receiver_signature: Bytes,
}

impl Erc721Claim {
    fn authorization(&self) -> LinkAuthorization<'_> {
        LinkAuthorization {
            link_key: self.link_key,
            binding: IssuerBinding::KeyOnly,
            receiver: self.receiver,
            issuer_signature: &self.issuer_signature,
            receiver_signature: &self.receiver_signature,
        }
    }
}

/// A registry campaign. Dereferences to the shared [`Campaign`].
#[derive(Debug)]
pub struct LinkdropErc721<L> {
    campaign: Campaign<L>,
    config: Erc721CampaignConfig,
}

impl<L: ValueLedger> LinkdropErc721<L> {
    /// Deploys a campaign on `ledger`.
    ///
    /// # Errors
    ///
    /// [`LinkdropError::InvalidConfig`] if the registry or any deployment
    /// address is zero; [`LinkdropError::Funding`] if the initial deposit
    /// fails.
    pub async fn deploy(
        ledger: L,
        deployment: Deployment,
        config: Erc721CampaignConfig,
    ) -> Result<Self, LinkdropError> {
        if config.registry.is_zero() {
            return Err(LinkdropError::InvalidConfig(
                "registry address is the zero address".into(),
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

    /// Whether the verification key signed `(link_key)`.
    #[must_use]
    pub fn verify_link_key(&self, link_key: Address, issuer_signature: &[u8]) -> bool {
        authorization::verify_link_key_simple(
            self.config.verification_address,
            link_key,
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

    /// Redeems a link on behalf of `caller`, the relayer.
    ///
    /// # Errors
    ///
    /// Same order as the fungible variant: paused, link key, receiver,
    /// already claimed, then funding (token missing, not owned by the issuer,
    /// or the campaign not approved).
    pub async fn withdraw(
        &self,
        caller: Address,
        claim: &Erc721Claim,
    ) -> Result<ClaimReceipt, LinkdropError> {
        let transfers = vec![Transfer::Nft {
            registry: self.config.registry,
            from: self.campaign.issuer(),
            to: claim.receiver,
            token_id: claim.token_id,
        }];
        let transfers = self
            .campaign
            .redeem(caller, &claim.authorization(), transfers)
            .await?;

        let event = Withdrawn {
            link_key: claim.link_key,
            receiver: claim.receiver,
            referral: Address::ZERO,
            token_id: Some(claim.token_id),
            amount: U256::from(1),
            referral_amount: U256::ZERO,
            relayer: caller,
            native_rebate: self.campaign.claim_amount_native(),
        };
        Ok(ClaimReceipt { event, transfers })
    }
}

impl<L> LinkdropErc721<L> {
    /// Immutable campaign parameters.
    #[must_use]
    pub const fn config(&self) -> &Erc721CampaignConfig {
        &self.config
    }
}

impl<L> Deref for LinkdropErc721<L> {
    type Target = Campaign<L>;

    fn deref(&self) -> &Self::Target {
        &self.campaign
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::ErrorKind;
    use crate::ledger::{Asset, InMemoryLedger, LedgerError};
    use crate::test_support::{Link, amount, signer};

    const REGISTRY: Address = Address::repeat_byte(0x72);
    const CAMPAIGN: Address = Address::repeat_byte(0xCB);
    const ISSUER: Address = Address::repeat_byte(0x16);
    const RELAYER: Address = Address::repeat_byte(0x9F);
    const RECEIVER: Address = Address::repeat_byte(0xCD);

    async fn deploy(
        native: u64,
    ) -> (
        Arc<InMemoryLedger>,
        LinkdropErc721<Arc<InMemoryLedger>>,
        alloy_signer_local::PrivateKeySigner,
    ) {
        let verifier = signer(0x61);
        let ledger = Arc::new(InMemoryLedger::new());
        for id in 1..=3 {
            ledger.mint_nft(REGISTRY, ISSUER, amount(id)).await;
        }
        ledger
            .set_approval_for_all(REGISTRY, ISSUER, CAMPAIGN, true)
            .await;
        ledger
            .mint(Asset::Native, ISSUER, amount(10_000))
            .await
            .unwrap();
        let linkdrop = LinkdropErc721::deploy(
            Arc::clone(&ledger),
            Deployment {
                address: CAMPAIGN,
                owner: ISSUER,
                value: amount(native * 2),
            },
            Erc721CampaignConfig {
                registry: REGISTRY,
                claim_amount_native: amount(native),
                verification_address: verifier.address(),
            },
        )
        .await
        .unwrap();
        (ledger, linkdrop, verifier)
    }

    fn claim(link: &Link, receiver: Address, token_id: u64) -> Erc721Claim {
        Erc721Claim {
            receiver,
            token_id: amount(token_id),
            link_key: link.address(),
            issuer_signature: link.issuer_signature.clone(),
            receiver_signature: link.sign_receiver(receiver),
        }
    }

    #[tokio::test]
    async fn test_claim_moves_token_once() {
        let (ledger, linkdrop, verifier) = deploy(0).await;
        let link = Link::simple(&verifier, 1);
        let request = claim(&link, RECEIVER, 2);

        let receipt = linkdrop.withdraw(RELAYER, &request).await.unwrap();
        assert_eq!(receipt.event.token_id, Some(amount(2)));
        assert_eq!(ledger.owner_of(REGISTRY, amount(2)).await.unwrap(), RECEIVER);

        let err = linkdrop.withdraw(RELAYER, &request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Replay);
    }

    #[tokio::test]
    async fn test_referral_bound_link_is_not_accepted() {
        let (_ledger, linkdrop, verifier) = deploy(0).await;
        let link = Link::new(&verifier, 2, Address::ZERO);
        let err = linkdrop
            .withdraw(RELAYER, &claim(&link, RECEIVER, 1))
            .await
            .unwrap_err();
        assert_eq!(err, LinkdropError::LinkKeyNotSigned);
    }

    #[tokio::test]
    async fn test_missing_token_keeps_link_redeemable() {
        let (ledger, linkdrop, verifier) = deploy(0).await;
        let link = Link::simple(&verifier, 3);

        let err = linkdrop
            .withdraw(RELAYER, &claim(&link, RECEIVER, 99))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LinkdropError::Funding(LedgerError::NonexistentToken { .. })
        ));
        assert!(!linkdrop.is_claimed(link.address()).await);

        ledger.mint_nft(REGISTRY, ISSUER, amount(99)).await;
        linkdrop
            .withdraw(RELAYER, &claim(&link, RECEIVER, 99))
            .await
            .unwrap();
        assert!(linkdrop.is_claimed(link.address()).await);
    }

    #[tokio::test]
    async fn test_rebate_and_pause() {
        let (ledger, linkdrop, verifier) = deploy(50).await;
        let link = Link::simple(&verifier, 4);
        let request = claim(&link, RECEIVER, 1);

        linkdrop.pause(ISSUER).await.unwrap();
        assert_eq!(
            linkdrop.withdraw(RELAYER, &request).await.unwrap_err(),
            LinkdropError::Paused
        );
        linkdrop.unpause(ISSUER).await.unwrap();

        linkdrop.withdraw(RELAYER, &request).await.unwrap();
        assert_eq!(
            ledger.balance_of(Asset::Native, RELAYER).await.unwrap(),
            amount(50)
        );
        assert_eq!(linkdrop.balance().await.unwrap(), amount(50));
        assert!(
            linkdrop.verify_link_key(link.address(), &link.issuer_signature)
        );
    }
}
