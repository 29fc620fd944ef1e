//! Request handlers.
//!
//! Outcomes that are part of normal operation (too far, already claimed, a
//! duplicate vote) are answered with a `status` body and a matching HTTP code.
//! Failures go through [`RpcError`].

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use cleanchain_claims::ClaimResult;
use cleanchain_node::{LocationView, ProfileUpdate, UserView};
use cleanchain_rewards::RewardResult;
use cleanchain_store::VoteType;
use cleanchain_types::{LocationId, Timestamp, TokenAmount, WalletId};
use cleanchain_verification::{ConsensusResult, VoteResult};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::RpcError;
use crate::server::RpcState;

type ApiResult<T> = Result<T, RpcError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| RpcError::InvalidRequest(rejection.body_text()))
}

fn location_id(raw: &str) -> ApiResult<LocationId> {
    LocationId::parse(raw).map_err(|e| RpcError::InvalidRequest(e.to_string()))
}

fn wallet_id(raw: &str) -> ApiResult<WalletId> {
    WalletId::parse(raw).map_err(|e| RpcError::InvalidRequest(e.to_string()))
}

// ── Locations ───────────────────────────────────────────────────────────

pub async fn list_locations(State(state): State<Arc<RpcState>>) -> ApiResult<Json<Vec<LocationView>>> {
    Ok(Json(state.engine.locations()?))
}

pub async fn get_location(
    State(state): State<Arc<RpcState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<LocationView>> {
    let id = location_id(&id)?;
    Ok(Json(state.engine.location(&id)?))
}

pub async fn user_locations(
    State(state): State<Arc<RpcState>>,
    Path(wallet): Path<String>,
) -> ApiResult<Json<Vec<LocationView>>> {
    let wallet = wallet_id(&wallet)?;
    Ok(Json(state.engine.user_locations(&wallet)?))
}

// ── Claims ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub wallet_address: String,
    pub location_id: String,
    pub user_lat: f64,
    pub user_lng: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<Timestamp>,
}

impl ClaimResponse {
    fn status(status: &'static str) -> Self {
        Self {
            status,
            distance: None,
            claimed_at: None,
        }
    }
}

pub async fn claim_location(
    State(state): State<Arc<RpcState>>,
    payload: Result<Json<ClaimRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ClaimResponse>)> {
    let req = body(payload)?;
    let id = location_id(&req.location_id)?;
    let claimant = wallet_id(&req.wallet_address)?;

    let result = state
        .engine
        .claim_location(&id, &claimant, req.user_lat, req.user_lng)
        .await?;

    let reply = match result {
        ClaimResult::Claimed { claimed_at } => (
            StatusCode::OK,
            ClaimResponse {
                claimed_at: Some(claimed_at),
                ..ClaimResponse::status("claimed")
            },
        ),
        ClaimResult::AlreadyCleaned { by_you } => (
            StatusCode::CONFLICT,
            ClaimResponse::status(if by_you {
                "already cleaned by you"
            } else {
                "already cleaned"
            }),
        ),
        ClaimResult::AlreadyClaimed { by_you } => (
            StatusCode::CONFLICT,
            ClaimResponse::status(if by_you {
                "already claimed by you"
            } else {
                "already claimed"
            }),
        ),
        ClaimResult::TooFar { distance_m } => (
            StatusCode::FORBIDDEN,
            ClaimResponse {
                distance: Some(distance_m),
                ..ClaimResponse::status("too far")
            },
        ),
    };
    Ok((reply.0, Json(reply.1)))
}

// ── Votes ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub voter_id: String,
    pub location_id: String,
    pub vote_type: VoteType,
}

#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RewardBody {
    Rewarded { tx_id: String, amount: TokenAmount },
    AlreadyRewarded,
    InProgress,
    NoWalletOnFile,
}

impl From<RewardResult> for RewardBody {
    fn from(result: RewardResult) -> Self {
        match result {
            RewardResult::Rewarded { tx_id, amount } => Self::Rewarded {
                tx_id: tx_id.to_string(),
                amount,
            },
            RewardResult::AlreadyRewarded => Self::AlreadyRewarded,
            RewardResult::InProgress => Self::InProgress,
            RewardResult::NoWalletOnFile => Self::NoWalletOnFile,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConsensusBody {
    Pending { up_votes: u32, needed: u32 },
    AwaitingClaim,
    Settled,
    Reached { reward: RewardBody },
}

impl From<ConsensusResult> for ConsensusBody {
    fn from(result: ConsensusResult) -> Self {
        match result {
            ConsensusResult::Pending { up_votes, needed } => Self::Pending { up_votes, needed },
            ConsensusResult::AwaitingClaim => Self::AwaitingClaim,
            ConsensusResult::Settled => Self::Settled,
            ConsensusResult::Reached(reward) => Self::Reached {
                reward: reward.into(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_votes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_votes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consensus: Option<ConsensusBody>,
}

pub async fn vote(
    State(state): State<Arc<RpcState>>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<VoteResponse>)> {
    let req = body(payload)?;
    let id = location_id(&req.location_id)?;
    let voter = wallet_id(&req.voter_id)?;

    let outcome = state.engine.vote(&id, &voter, req.vote_type).await?;
    let consensus = outcome.consensus.map(ConsensusBody::from);
    let (code, response) = match outcome.vote {
        VoteResult::Recorded {
            up_votes,
            total_votes,
        } => (
            StatusCode::OK,
            VoteResponse {
                status: "recorded",
                up_votes: Some(up_votes),
                total_votes: Some(total_votes),
                consensus,
            },
        ),
        VoteResult::SelfVoteForbidden => (
            StatusCode::FORBIDDEN,
            VoteResponse {
                status: "cannot vote on own claim",
                up_votes: None,
                total_votes: None,
                consensus,
            },
        ),
        VoteResult::DuplicateVote => (
            StatusCode::CONFLICT,
            VoteResponse {
                status: "already voted",
                up_votes: None,
                total_votes: None,
                consensus,
            },
        ),
    };
    Ok((code, Json(response)))
}

// ── Distance ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DistanceQuery {
    pub lat1: f64,
    pub lng1: f64,
    pub lat2: f64,
    pub lng2: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceResponse {
    pub distance_in_meters: f64,
    pub is_nearby: bool,
}

pub async fn test_distance(
    State(state): State<Arc<RpcState>>,
    query: Result<Query<DistanceQuery>, axum::extract::rejection::QueryRejection>,
) -> ApiResult<Json<DistanceResponse>> {
    let Query(q) = query.map_err(|rejection| RpcError::InvalidRequest(rejection.body_text()))?;
    let report = state.engine.distance(q.lat1, q.lng1, q.lat2, q.lng2)?;
    Ok(Json(DistanceResponse {
        distance_in_meters: report.meters,
        is_nearby: report.within_range,
    }))
}

// ── Uploads ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCompleteRequest {
    pub after_photo_url: String,
}

pub async fn upload_complete(
    State(state): State<Arc<RpcState>>,
    Path(id): Path<String>,
    payload: Result<Json<UploadCompleteRequest>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let req = body(payload)?;
    let id = location_id(&id)?;
    let location = state.engine.complete_upload(&id, &req.after_photo_url)?;
    Ok(Json(json!({
        "message": "upload recorded",
        "afterPhotoUrl": location.after_photo_url,
        "location": location,
    })))
}

// ── Auth ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletLoginRequest {
    pub wallet_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletLoginResponse {
    pub is_new_user: bool,
    pub user_data: UserView,
}

pub async fn wallet_login(
    State(state): State<Arc<RpcState>>,
    payload: Result<Json<WalletLoginRequest>, JsonRejection>,
) -> ApiResult<Json<WalletLoginResponse>> {
    let req = body(payload)?;
    let wallet = wallet_id(&req.wallet_address)?;
    let registration = state.engine.register_wallet(&wallet)?;
    Ok(Json(WalletLoginResponse {
        is_new_user: registration.is_new_user,
        user_data: registration.user,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub wallet_address: String,
    pub username: Option<String>,
    pub email: Option<String>,
    /// Payout address, when it differs from the login wallet.
    pub payout_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileResponse {
    pub message: &'static str,
    pub user_data: UserView,
}

pub async fn update_profile(
    State(state): State<Arc<RpcState>>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Json<UpdateProfileResponse>> {
    let req = body(payload)?;
    let wallet = wallet_id(&req.wallet_address)?;
    let username = req
        .username
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| RpcError::InvalidRequest("username is required".into()))?;
    let payout = req.payout_address.as_deref().map(wallet_id).transpose()?;

    let update = ProfileUpdate {
        display_name: Some(username),
        email: req.email.filter(|email| !email.trim().is_empty()),
        wallet_address: payout,
    };
    let user = state.engine.update_profile(&wallet, update)?;
    Ok(Json(UpdateProfileResponse {
        message: "profile updated",
        user_data: user,
    }))
}

// ── Operations ──────────────────────────────────────────────────────────

pub async fn health(State(state): State<Arc<RpcState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "ledger": state.engine.ledger_name(),
        "claimRadiusM": state.engine.params().claim_radius_m,
    }))
}

pub async fn metrics(State(state): State<Arc<RpcState>>) -> Response {
    if !state.enable_metrics {
        return StatusCode::NOT_FOUND.into_response();
    }
    match state.engine.metrics().encode() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => RpcError::from(e).into_response(),
    }
}
