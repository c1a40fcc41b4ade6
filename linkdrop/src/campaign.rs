//! State and behaviour shared by both campaign variants.
//!
//! [`Campaign`] owns the access state and the claim ledger behind a single
//! [`tokio::sync::Mutex`]. Every state-mutating operation runs entirely inside
//! that critical section, including the awaited ledger call, so two
//! redemptions of the same link can never interleave. A link is marked as
//! claimed before its batch is submitted and unmarked only if the ledger
//! rejects the batch.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::access::AccessState;
use crate::authorization::LinkAuthorization;
use crate::claims::ClaimLedger;
use crate::error::LinkdropError;
use crate::ledger::{Asset, Transfer, ValueLedger};

/// Where and by whom a campaign is deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// The campaign's own identity on the value ledger. It is the spender of
    /// the issuer's allowance and the holder of the native rebate pool.
    pub address: Address,
    /// Deploying identity: the initial owner and the issuer whose funds are
    /// distributed.
    pub owner: Address,
    /// Native currency moved from `owner` to `address` at deployment.
    #[serde(default)]
    pub value: U256,
}

/// Record of a successful claim, published for external indexers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawn {
    /// Link that was redeemed.
    pub link_key: Address,
    /// Receiver named by the link holder.
    pub receiver: Address,
    /// Referral bound by the issuer; zero when there is none.
    pub referral: Address,
    /// Registry token handed out, for registry campaigns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<U256>,
    /// Token units credited to the receiver.
    pub amount: U256,
    /// Token units credited to the referral.
    pub referral_amount: U256,
    /// Party that submitted the claim.
    pub relayer: Address,
    /// Native currency paid to the relayer.
    pub native_rebate: U256,
}

/// Outcome of a successful claim: the record plus the ledger movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    /// The claim record.
    pub event: Withdrawn,
    /// Transfers applied by the value ledger, in order.
    pub transfers: Vec<Transfer>,
}

#[derive(Debug)]
struct CampaignState {
    access: AccessState,
    claims: ClaimLedger,
}

/// Claim machinery common to every campaign variant.
#[derive(Debug)]
pub struct Campaign<L> {
    ledger: L,
    address: Address,
    issuer: Address,
    verification_address: Address,
    claim_amount_native: U256,
    state: Mutex<CampaignState>,
}

impl<L: ValueLedger> Campaign<L> {
    /// Validates the parameters and moves the initial deposit, if any.
    pub(crate) async fn deploy(
        ledger: L,
        deployment: Deployment,
        verification_address: Address,
        claim_amount_native: U256,
    ) -> Result<Self, LinkdropError> {
        if deployment.address.is_zero() {
            return Err(LinkdropError::InvalidConfig(
                "campaign address is the zero address".into(),
            ));
        }
        if verification_address.is_zero() {
            return Err(LinkdropError::InvalidConfig(
                "verification address is the zero address".into(),
            ));
        }
        let access = AccessState::new(deployment.owner)
            .map_err(|_| LinkdropError::InvalidConfig("owner is the zero address".into()))?;

        if !deployment.value.is_zero() {
            ledger
                .execute(
                    deployment.owner,
                    &[Transfer::Native {
                        from: deployment.owner,
                        to: deployment.address,
                        amount: deployment.value,
                    }],
                )
                .await?;
        }

        #[cfg(feature = "telemetry")]
        tracing::info!(
            campaign = %deployment.address,
            owner = %deployment.owner,
            verification_address = %verification_address,
            deposit = %deployment.value,
            "Campaign deployed"
        );

        Ok(Self {
            ledger,
            address: deployment.address,
            issuer: deployment.owner,
            verification_address,
            claim_amount_native,
            state: Mutex::new(CampaignState {
                access,
                claims: ClaimLedger::new(),
            }),
        })
    }

    /// Runs a claim: guard, both signature chains, replay check, then the
    /// transfer batch extended with the relayer rebate. The link stays
    /// recorded unless the ledger returns an error for the batch.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        campaign = %self.address,
        link_key = %auth.link_key,
        receiver = %auth.receiver,
        relayer = %caller
    )))]
    pub(crate) async fn redeem(
        &self,
        caller: Address,
        auth: &LinkAuthorization<'_>,
        mut transfers: Vec<Transfer>,
    ) -> Result<Vec<Transfer>, LinkdropError> {
        let mut state = self.state.lock().await;
        state.access.ensure_active()?;
        auth.authorize(self.verification_address)?;
        state.claims.ensure_unclaimed(auth.link_key)?;

        if !self.claim_amount_native.is_zero() {
            transfers.push(Transfer::Native {
                from: self.address,
                to: caller,
                amount: self.claim_amount_native,
            });
        }
        // Released only on a ledger error; a claim dropped mid-execute keeps
        // the link burned.
        state.claims.check_and_set(auth.link_key)?;
        if let Err(e) = self.ledger.execute(self.address, &transfers).await {
            state.claims.release(&auth.link_key);
            return Err(e.into());
        }

        #[cfg(feature = "telemetry")]
        tracing::info!(transfers = transfers.len(), "Link redeemed");

        Ok(transfers)
    }

    /// Sends the campaign's whole balance of `asset` to the owner. Allowed
    /// while paused. Returns the amount moved.
    pub(crate) async fn sweep(&self, caller: Address, asset: Asset) -> Result<U256, LinkdropError> {
        let state = self.state.lock().await;
        state.access.ensure_owner(caller)?;
        let owner = state.access.owner();
        let amount = self.ledger.balance_of(asset, self.address).await?;
        if amount.is_zero() {
            return Ok(amount);
        }
        let transfer = match asset {
            Asset::Native => Transfer::Native {
                from: self.address,
                to: owner,
                amount,
            },
            Asset::Token(token) => Transfer::Token {
                token,
                from: self.address,
                to: owner,
                amount,
            },
        };
        self.ledger.execute(self.address, &[transfer]).await?;

        #[cfg(feature = "telemetry")]
        tracing::info!(campaign = %self.address, %asset, %amount, %owner, "Residual funds withdrawn");

        Ok(amount)
    }

    /// Pauses claims.
    ///
    /// # Errors
    ///
    /// [`LinkdropError::NotOwner`] or [`LinkdropError::Paused`].
    pub async fn pause(&self, caller: Address) -> Result<(), LinkdropError> {
        self.state.lock().await.access.pause(caller)?;
        #[cfg(feature = "telemetry")]
        tracing::warn!(campaign = %self.address, "Campaign paused");
        Ok(())
    }

    /// Resumes claims.
    ///
    /// # Errors
    ///
    /// [`LinkdropError::NotOwner`] or [`LinkdropError::NotPaused`].
    pub async fn unpause(&self, caller: Address) -> Result<(), LinkdropError> {
        self.state.lock().await.access.unpause(caller)?;
        #[cfg(feature = "telemetry")]
        tracing::info!(campaign = %self.address, "Campaign unpaused");
        Ok(())
    }

    /// Hands ownership to `new_owner`. The issuer whose funds are distributed
    /// does not change.
    ///
    /// # Errors
    ///
    /// [`LinkdropError::NotOwner`] or [`LinkdropError::ZeroOwner`].
    pub async fn transfer_ownership(
        &self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), LinkdropError> {
        self.state
            .lock()
            .await
            .access
            .transfer_ownership(caller, new_owner)?;
        #[cfg(feature = "telemetry")]
        tracing::info!(campaign = %self.address, %new_owner, "Ownership transferred");
        Ok(())
    }

    /// Sends the campaign's residual native balance to the owner.
    ///
    /// # Errors
    ///
    /// [`LinkdropError::NotOwner`], or [`LinkdropError::Funding`] if the
    /// ledger refuses.
    pub async fn withdraw_native(&self, caller: Address) -> Result<U256, LinkdropError> {
        self.sweep(caller, Asset::Native).await
    }

    /// Native balance held by the campaign.
    ///
    /// # Errors
    ///
    /// [`LinkdropError::Funding`] if the ledger query fails.
    pub async fn balance(&self) -> Result<U256, LinkdropError> {
        Ok(self.ledger.balance_of(Asset::Native, self.address).await?)
    }

    /// Whether `link_key` has been redeemed.
    pub async fn is_claimed(&self, link_key: Address) -> bool {
        self.state.lock().await.claims.is_claimed(&link_key)
    }

    /// Whether claims are paused.
    pub async fn is_paused(&self) -> bool {
        self.state.lock().await.access.is_paused()
    }

    /// Current owner.
    pub async fn owner(&self) -> Address {
        self.state.lock().await.access.owner()
    }
}

impl<L> Campaign<L> {
    /// The campaign's own ledger identity.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Identity whose funds are distributed.
    #[must_use]
    pub const fn issuer(&self) -> Address {
        self.issuer
    }

    /// Key that must sign every link key.
    #[must_use]
    pub const fn verification_address(&self) -> Address {
        self.verification_address
    }

    /// Native rebate paid to the relayer per claim.
    #[must_use]
    pub const fn claim_amount_native(&self) -> U256 {
        self.claim_amount_native
    }

    /// The value ledger this campaign moves funds on.
    #[must_use]
    pub const fn ledger(&self) -> &L {
        &self.ledger
    }
}
