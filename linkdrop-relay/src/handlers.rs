//! Axum route handlers for the relay service.
//!
//! The router is generic over the value ledger so the same endpoints serve the
//! in-memory ledger and any host-backed implementation.

use std::sync::Arc;

use alloy_primitives::Address;
use axum::Json;
use axum::extract::{Path, State};
use linkdrop::{ClaimReceipt, ValueLedger};

use crate::error::RelayError;
use crate::relay::{CampaignStatus, ClaimRequest, ClaimStatus, Relay, VerifyResponse};

/// Shared application state for the relay service.
pub type RelayState<L> = Arc<Relay<L>>;

/// `GET /health` - Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /campaign` - Campaign parameters, owner, pause flag and rebate pool.
///
/// # Errors
///
/// Returns 402 if the ledger cannot report the campaign balance.
pub async fn get_campaign<L: ValueLedger + 'static>(
    State(relay): State<RelayState<L>>,
) -> Result<Json<CampaignStatus>, RelayError> {
    Ok(Json(relay.status().await?))
}

/// `GET /claims/{link_key}` - Whether a link key has been redeemed.
pub async fn get_claim<L: ValueLedger + 'static>(
    State(relay): State<RelayState<L>>,
    Path(link_key): Path<Address>,
) -> Json<ClaimStatus> {
    Json(relay.claim_status(link_key).await)
}

/// `POST /verify` - Checks both signatures of a claim without redeeming it.
///
/// # Errors
///
/// Returns 400 if the body does not fit the campaign variant.
pub async fn post_verify<L: ValueLedger + 'static>(
    State(relay): State<RelayState<L>>,
    Json(body): Json<ClaimRequest>,
) -> Result<Json<VerifyResponse>, RelayError> {
    Ok(Json(relay.verify(&body)?))
}

/// `POST /claim` - Redeems a link on behalf of its receiver.
///
/// # Errors
///
/// Returns 403 on a bad signature, 409 on a redeemed link, 423 while paused,
/// 402 when the campaign cannot fund the claim, or 400 on a mismatched body.
pub async fn post_claim<L: ValueLedger + 'static>(
    State(relay): State<RelayState<L>>,
    Json(body): Json<ClaimRequest>,
) -> Result<Json<ClaimReceipt>, RelayError> {
    Ok(Json(relay.claim(body).await?))
}

/// Creates an Axum [`axum::Router`] with all relay endpoints.
///
/// Endpoints:
/// - `GET /health` - liveness probe
/// - `GET /campaign` - campaign status
/// - `GET /claims/{link_key}` - claim status of a link
/// - `POST /verify` - dry-run signature check
/// - `POST /claim` - redeem a link
pub fn relay_router<L: ValueLedger + 'static>(state: RelayState<L>) -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(health))
        .route("/campaign", axum::routing::get(get_campaign::<L>))
        .route("/claims/{link_key}", axum::routing::get(get_claim::<L>))
        .route("/verify", axum::routing::post(post_verify::<L>))
        .route("/claim", axum::routing::post(post_claim::<L>))
        .with_state(state)
}
