//! API error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cleanchain_claims::ClaimError;
use cleanchain_node::NodeError;
use cleanchain_rewards::RewardError;
use cleanchain_store::StoreError;
use cleanchain_verification::{ConsensusError, VotingError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Concurrent updates kept colliding, or the request conflicts with the
    /// record's current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The token ledger failed; the reward is left for reconciliation.
    #[error("ledger failure: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn short_status(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid request",
            Self::NotFound(_) => "not found",
            Self::Conflict(_) => "conflict, retry",
            Self::Upstream(_) => "ledger unavailable",
            Self::Internal(_) | Self::Server(_) => "internal error",
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = json!({ "status": self.short_status(), "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for RpcError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(key) => Self::NotFound(key),
            StoreError::Conflict(key) => Self::Conflict(format!("{key} is busy")),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<RewardError> for RpcError {
    fn from(e: RewardError) -> Self {
        match e {
            RewardError::NotFound(id) => Self::NotFound(id.to_string()),
            RewardError::NotClaimed(_) | RewardError::NotInFlight(_) => Self::Conflict(e.to_string()),
            RewardError::Transfer { .. }
            | RewardError::TransferTimedOut { .. }
            | RewardError::Finalize { .. } => Self::Upstream(e.to_string()),
            RewardError::UnrecordedTransfer { .. } => Self::Upstream(e.to_string()),
            RewardError::AmountOverflow(_) | RewardError::Interrupted { .. } => {
                Self::Internal(e.to_string())
            }
            RewardError::Store(e) => e.into(),
        }
    }
}

impl From<NodeError> for RpcError {
    fn from(e: NodeError) -> Self {
        match e {
            NodeError::Claim(ClaimError::NotFound(id)) => Self::NotFound(id.to_string()),
            NodeError::Claim(ClaimError::InvalidPosition(e)) => Self::InvalidRequest(e.to_string()),
            NodeError::Claim(ClaimError::Store(e)) => e.into(),
            NodeError::Voting(VotingError::NotFound(id)) => Self::NotFound(id.to_string()),
            NodeError::Voting(VotingError::Store(e)) => e.into(),
            NodeError::Consensus(ConsensusError::NotFound(id)) => Self::NotFound(id.to_string()),
            NodeError::Consensus(ConsensusError::Store(e)) => e.into(),
            NodeError::Consensus(ConsensusError::Reward(e)) => e.into(),
            NodeError::Reward(e) => e.into(),
            NodeError::Store(e) => e.into(),
            NodeError::Invalid(e) => Self::InvalidRequest(e.to_string()),
            NodeError::LocationNotFound(id) => Self::NotFound(id),
            NodeError::UploadRejected(reason) => Self::Conflict(reason),
            other => Self::Internal(other.to_string()),
        }
    }
}
