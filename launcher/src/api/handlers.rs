//! API request handlers

use super::error::parse_address;
use super::{responses::*, ApiError, ApiState, Caller};
use crate::core::{LaunchError, NewLaunch, PledgeId};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use std::str::FromStr;
use tracing::info;

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Launches
// ============================================================================

/// Register a launch (admin)
pub async fn register_launch(
    State(state): State<ApiState>,
    Caller(caller): Caller,
    Json(request): Json<RegisterLaunchRequest>,
) -> Result<(StatusCode, Json<LaunchResponse>), ApiError> {
    state.launches.admins().check(caller, "register launches")?;

    let launch = state
        .ledger
        .register_launch(NewLaunch {
            influencer: request.influencer,
            influencer_name: request.influencer_name,
            token_name: request.token_name,
            token_symbol: request.token_symbol,
            threshold_eth: request.threshold_eth,
            threshold_usdc: request.threshold_usdc,
        })
        .await?;
    info!(influencer = %launch.influencer, registered_by = %caller, "Launch registration accepted");

    let progress = launch.progress();
    Ok((StatusCode::CREATED, Json(LaunchResponse { launch, progress })))
}

pub async fn list_launches(State(state): State<ApiState>) -> ApiResult<LaunchesResponse> {
    let launches = state.ledger.launches().await?;
    Ok(Json(LaunchesResponse {
        total: launches.len(),
        launches,
    }))
}

pub async fn get_launch(State(state): State<ApiState>, Path(address): Path<String>) -> ApiResult<LaunchResponse> {
    let launch = state.ledger.launch(parse_address(&address)?).await?;
    let progress = launch.progress();
    Ok(Json(LaunchResponse { launch, progress }))
}

pub async fn get_launch_pledges(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> ApiResult<PledgesResponse> {
    let pledges = state.ledger.pledges_for(parse_address(&address)?).await?;
    Ok(Json(PledgesResponse {
        total: pledges.len(),
        pledges,
    }))
}

pub async fn get_bootstrap(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> ApiResult<BootstrapResponse> {
    let influencer = parse_address(&address)?;
    let bootstrap = state.launches.bootstrap_record(influencer).await?;
    Ok(Json(BootstrapResponse {
        bootstrap,
        in_flight: state.launches.coordinator().is_in_flight(&influencer),
    }))
}

pub async fn get_launch_events(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> ApiResult<EventsResponse> {
    let events = state.ledger.events(parse_address(&address)?).await?;
    Ok(Json(EventsResponse { events }))
}

pub async fn get_stats(State(state): State<ApiState>) -> ApiResult<StatsResponse> {
    Ok(Json(StatsResponse {
        stats: state.ledger.stats().await?,
    }))
}

// ============================================================================
// Pledges
// ============================================================================

/// Pledge as the calling identity
pub async fn submit_pledge(
    State(state): State<ApiState>,
    Caller(pledger): Caller,
    Json(request): Json<PledgeRequest>,
) -> Result<(StatusCode, Json<PledgeCreatedResponse>), ApiError> {
    let pledge_id = state
        .ledger
        .submit_pledge(
            request.influencer,
            pledger,
            request.amount,
            request.currency,
            request.tx_hash,
        )
        .await?;
    let launch = state.ledger.launch(request.influencer).await?;
    Ok((StatusCode::CREATED, Json(PledgeCreatedResponse { pledge_id, launch })))
}

pub async fn get_pledge(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult<PledgeResponse> {
    let pledge = state.ledger.pledge(parse_pledge_id(&id)?).await?;
    Ok(Json(PledgeResponse { pledge }))
}

/// Withdraw one of the caller's own pledges
pub async fn withdraw_pledge(
    State(state): State<ApiState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<PledgeResponse> {
    let id = parse_pledge_id(&id)?;
    let pledge = state.ledger.pledge(id).await?;
    if pledge.pledger != caller {
        return Err(LaunchError::Unauthorized {
            caller,
            action: "withdraw another pledger's pledge",
        }
        .into());
    }

    let pledge = state.ledger.withdraw_pledge(id).await?;
    Ok(Json(PledgeResponse { pledge }))
}

pub async fn get_pledger_pledges(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> ApiResult<PledgesResponse> {
    let pledges = state.ledger.pledges_by(parse_address(&address)?).await?;
    Ok(Json(PledgesResponse {
        total: pledges.len(),
        pledges,
    }))
}

// ============================================================================
// Admin
// ============================================================================

pub async fn approve_launch(
    State(state): State<ApiState>,
    Caller(caller): Caller,
    Json(request): Json<ApproveRequest>,
) -> ApiResult<LaunchResponse> {
    let launch = state.launches.approve(caller, request.influencer).await?;
    let progress = launch.progress();
    Ok(Json(LaunchResponse { launch, progress }))
}

/// Run (or resume) the launch of an approved influencer
pub async fn launch(
    State(state): State<ApiState>,
    Caller(caller): Caller,
    Json(request): Json<LaunchRequest>,
) -> ApiResult<LaunchedResponse> {
    let outcome = state
        .launches
        .launch(caller, request.influencer, request.token_address)
        .await?;
    Ok(Json(LaunchedResponse {
        launch: outcome.launch,
        bootstrap: outcome.bootstrap,
    }))
}

fn parse_pledge_id(raw: &str) -> Result<PledgeId, ApiError> {
    PledgeId::from_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("invalid pledge id: {}", raw)))
}
