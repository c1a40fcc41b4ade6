//! Claim submission on behalf of receivers.
//!
//! A [`Relay`] serves one campaign and submits every claim with its own
//! address as caller, so native rebates flow back to the relay.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use linkdrop::{
    Asset, ClaimReceipt, Deployment, Erc20Claim, Erc721Claim, InMemoryLedger, LinkdropErc20,
    LinkdropErc721, LinkdropError, ValueLedger,
};
use serde::{Deserialize, Serialize};

use crate::config::{CampaignParams, RelayConfig, SeedConfig};
use crate::error::RelayError;

/// The campaign a relay serves.
#[derive(Debug)]
pub enum CampaignHandle<L> {
    /// Fungible token campaign.
    Erc20(LinkdropErc20<L>),
    /// Ownership registry campaign.
    Erc721(LinkdropErc721<L>),
}

/// Claim body accepted by the relay.
///
/// `referral` applies to fungible campaigns, `token_id` to registry
/// campaigns; supplying the field of the other variant is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequest {
    /// Receiver named by the link holder.
    pub receiver: Address,
    /// Referral bound into the issuer signature.
    #[serde(default)]
    pub referral: Address,
    /// Registry token handed out by the link.
    #[serde(default)]
    pub token_id: Option<U256>,
    /// Public identity of the link key.
    pub link_key: Address,
    /// Verification key's signature over the link key.
    pub issuer_signature: Bytes,
    /// Link key's signature over the receiver.
    pub receiver_signature: Bytes,
}

/// Result of running both signature predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// The verification key signed the link key.
    pub link_key_valid: bool,
    /// The link key signed the receiver.
    pub receiver_valid: bool,
}

/// Public view of the served campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStatus {
    /// Campaign address.
    pub address: Address,
    /// Current owner.
    pub owner: Address,
    /// Whether claims are paused.
    pub paused: bool,
    /// Native balance available for rebates.
    pub balance: U256,
    /// Address the relay submits as.
    pub relayer: Address,
    /// Immutable campaign parameters.
    pub params: CampaignParams,
}

/// Claim state of one link key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimStatus {
    /// Link key queried.
    pub link_key: Address,
    /// Whether it has been redeemed.
    pub claimed: bool,
}

/// A relay bound to one campaign.
#[derive(Debug)]
pub struct Relay<L> {
    relayer: Address,
    campaign: CampaignHandle<L>,
}

impl<L: ValueLedger> Relay<L> {
    /// Creates a relay submitting claims as `relayer`.
    pub const fn new(relayer: Address, campaign: CampaignHandle<L>) -> Self {
        Self { relayer, campaign }
    }

    /// Address the relay submits as.
    #[must_use]
    pub const fn relayer(&self) -> Address {
        self.relayer
    }

    /// The served campaign, for owner operations.
    #[must_use]
    pub const fn campaign(&self) -> &CampaignHandle<L> {
        &self.campaign
    }

    /// Submits a claim to the campaign.
    ///
    /// # Errors
    ///
    /// [`RelayError::BadRequest`] for a body of the wrong variant, otherwise
    /// whatever the campaign returns.
    pub async fn claim(&self, request: ClaimRequest) -> Result<ClaimReceipt, RelayError> {
        let receipt = match &self.campaign {
            CampaignHandle::Erc20(linkdrop) => {
                let claim = erc20_claim(request)?;
                linkdrop.withdraw(self.relayer, &claim).await?
            }
            CampaignHandle::Erc721(linkdrop) => {
                let claim = erc721_claim(request)?;
                linkdrop.withdraw(self.relayer, &claim).await?
            }
        };
        tracing::info!(
            link_key = %receipt.event.link_key,
            receiver = %receipt.event.receiver,
            referral = %receipt.event.referral,
            amount = %receipt.event.amount,
            "Claim relayed"
        );
        Ok(receipt)
    }

    /// Runs both signature predicates without touching any state.
    ///
    /// # Errors
    ///
    /// [`RelayError::BadRequest`] for a body of the wrong variant.
    pub fn verify(&self, request: &ClaimRequest) -> Result<VerifyResponse, RelayError> {
        let response = match &self.campaign {
            CampaignHandle::Erc20(linkdrop) => {
                ensure_no_token_id(request)?;
                VerifyResponse {
                    link_key_valid: linkdrop.verify_link_key(
                        request.link_key,
                        request.referral,
                        &request.issuer_signature,
                    ),
                    receiver_valid: linkdrop.verify_receiver_address(
                        request.link_key,
                        request.receiver,
                        &request.receiver_signature,
                    ),
                }
            }
            CampaignHandle::Erc721(linkdrop) => {
                ensure_no_referral(request)?;
                VerifyResponse {
                    link_key_valid: linkdrop
                        .verify_link_key(request.link_key, &request.issuer_signature),
                    receiver_valid: linkdrop.verify_receiver_address(
                        request.link_key,
                        request.receiver,
                        &request.receiver_signature,
                    ),
                }
            }
        };
        Ok(response)
    }

    /// Public view of the campaign.
    ///
    /// # Errors
    ///
    /// [`RelayError::Linkdrop`] if the ledger balance query fails.
    pub async fn status(&self) -> Result<CampaignStatus, RelayError> {
        let status = match &self.campaign {
            CampaignHandle::Erc20(linkdrop) => CampaignStatus {
                address: linkdrop.address(),
                owner: linkdrop.owner().await,
                paused: linkdrop.is_paused().await,
                balance: linkdrop.balance().await?,
                relayer: self.relayer,
                params: CampaignParams::Erc20(linkdrop.config().clone()),
            },
            CampaignHandle::Erc721(linkdrop) => CampaignStatus {
                address: linkdrop.address(),
                owner: linkdrop.owner().await,
                paused: linkdrop.is_paused().await,
                balance: linkdrop.balance().await?,
                relayer: self.relayer,
                params: CampaignParams::Erc721(linkdrop.config().clone()),
            },
        };
        Ok(status)
    }

    /// Claim state of `link_key`.
    pub async fn claim_status(&self, link_key: Address) -> ClaimStatus {
        let claimed = match &self.campaign {
            CampaignHandle::Erc20(linkdrop) => linkdrop.is_claimed(link_key).await,
            CampaignHandle::Erc721(linkdrop) => linkdrop.is_claimed(link_key).await,
        };
        ClaimStatus { link_key, claimed }
    }
}

impl Relay<Arc<InMemoryLedger>> {
    /// Builds a relay over a fresh in-memory ledger: seeds it, then deploys
    /// the configured campaign on it.
    ///
    /// # Errors
    ///
    /// [`RelayError::Linkdrop`] if seeding or deployment fails.
    pub async fn standalone(config: &RelayConfig) -> Result<Self, RelayError> {
        let ledger = Arc::new(InMemoryLedger::new());
        seed_ledger(&ledger, &config.seed).await?;
        let campaign = deploy(
            Arc::clone(&ledger),
            config.campaign.deployment,
            config.campaign.params.clone(),
        )
        .await?;
        Ok(Self::new(config.relayer, campaign))
    }
}

/// Deploys the campaign variant described by `params`.
///
/// # Errors
///
/// Whatever the variant's `deploy` returns.
pub async fn deploy<L: ValueLedger>(
    ledger: L,
    deployment: Deployment,
    params: CampaignParams,
) -> Result<CampaignHandle<L>, LinkdropError> {
    let handle = match params {
        CampaignParams::Erc20(config) => {
            CampaignHandle::Erc20(LinkdropErc20::deploy(ledger, deployment, config).await?)
        }
        CampaignParams::Erc721(config) => {
            CampaignHandle::Erc721(LinkdropErc721::deploy(ledger, deployment, config).await?)
        }
    };
    Ok(handle)
}

async fn seed_ledger(ledger: &InMemoryLedger, seed: &SeedConfig) -> Result<(), LinkdropError> {
    for entry in &seed.native {
        ledger
            .mint(Asset::Native, entry.holder, entry.amount)
            .await?;
    }
    for entry in &seed.tokens {
        ledger
            .mint(Asset::Token(entry.token), entry.holder, entry.amount)
            .await?;
    }
    for entry in &seed.allowances {
        ledger
            .approve(entry.token, entry.owner, entry.spender, entry.amount)
            .await;
    }
    for entry in &seed.nfts {
        ledger
            .mint_nft(entry.registry, entry.owner, entry.token_id)
            .await;
    }
    for entry in &seed.operators {
        ledger
            .set_approval_for_all(entry.registry, entry.owner, entry.operator, true)
            .await;
    }
    Ok(())
}

fn ensure_no_token_id(request: &ClaimRequest) -> Result<(), RelayError> {
    if request.token_id.is_some() {
        return Err(RelayError::BadRequest(
            "token_id is not accepted by erc20 campaigns".into(),
        ));
    }
    Ok(())
}

fn ensure_no_referral(request: &ClaimRequest) -> Result<(), RelayError> {
    if !request.referral.is_zero() {
        return Err(RelayError::BadRequest(
            "referral is not accepted by erc721 campaigns".into(),
        ));
    }
    Ok(())
}

fn erc20_claim(request: ClaimRequest) -> Result<Erc20Claim, RelayError> {
    ensure_no_token_id(&request)?;
    Ok(Erc20Claim {
        receiver: request.receiver,
        referral: request.referral,
        link_key: request.link_key,
        issuer_signature: request.issuer_signature,
        receiver_signature: request.receiver_signature,
    })
}

fn erc721_claim(request: ClaimRequest) -> Result<Erc721Claim, RelayError> {
    ensure_no_referral(&request)?;
    let token_id = request.token_id.ok_or_else(|| {
        RelayError::BadRequest("token_id is required by erc721 campaigns".into())
    })?;
    Ok(Erc721Claim {
        receiver: request.receiver,
        token_id,
        link_key: request.link_key,
        issuer_signature: request.issuer_signature,
        receiver_signature: request.receiver_signature,
    })
}
