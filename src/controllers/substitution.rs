/*
 * src/controllers/substitution.rs
 *
 * File for Substitution Controller API Endpoints
 *
 * Purpose:
 *   Serve per-stop and whole-route replacement requests against an
 *   existing cached route (C9).
 *
 * Include:
 *   api_replace_poi         - POST /api/routes/replace-poi -> ranked replacement candidates
 *   api_confirm_replace     - POST /api/routes/confirm-replace -> commit a chosen replacement
 *   api_replace_full_route  - POST /api/routes/replace-full -> rebuild one cached route from a new query
 */

use axum::{Json, Router, extract::State, routing::post};
use std::str::FromStr;
use tracing::info;

use crate::error::{ApiResult, AppError, PublicError};
use crate::geo::LatLon;
use crate::http_models::substitution::{
	ConfirmReplaceRequest, ConfirmReplaceResponse, ReplaceFullRouteRequest, ReplaceFullRouteResponse,
	ReplacePoiRequest, ReplacePoiResponse, ReplacementCandidateResponse, UpdatedRoute,
};
use crate::model::mode::TransportMode;
use crate::orchestrator::PlanRequest;
use crate::state::AppState;

/// Rank replacement candidates for one stop of a cached route.
///
/// # Method
/// `POST /api/routes/replace-poi`
pub async fn api_replace_poi(
	State(state): State<AppState>,
	Json(body): Json<ReplacePoiRequest>,
) -> ApiResult<Json<ReplacePoiResponse>> {
	info!(
		"HANDLER ->> /api/routes/replace-poi 'api_replace_poi' - user_id: {}, route_id: {}",
		body.user_id, body.route_id
	);

	let candidates = state
		.orchestrator
		.replace_poi(
			&body.user_id,
			&body.route_id,
			&body.old_poi_id,
			LatLon::new(body.user_location.lat, body.user_location.lon),
			body.top_k,
			body.current_time,
		)
		.await?;

	let candidates = candidates
		.into_iter()
		.map(|c| ReplacementCandidateResponse {
			poi: c.poi,
			score: c.score,
			distance_delta_meters: c.distance_delta_meters,
			old_leg_minutes: c.old_leg_minutes,
			new_leg_minutes: c.new_leg_minutes,
		})
		.collect();

	Ok(Json(ReplacePoiResponse { candidates }))
}

/// Commit a previously-offered replacement candidate.
///
/// # Method
/// `POST /api/routes/confirm-replace`
///
/// # Responses
/// - `200 OK` - JSON body `ConfirmReplaceResponse`
/// - `409 CONFLICT` - the old POI is no longer where the caller expects
///   (a concurrent confirm or substitution already moved it, §5)
pub async fn api_confirm_replace(
	State(state): State<AppState>,
	Json(body): Json<ConfirmReplaceRequest>,
) -> ApiResult<Json<ConfirmReplaceResponse>> {
	info!(
		"HANDLER ->> /api/routes/confirm-replace 'api_confirm_replace' - user_id: {}, route_id: {}",
		body.user_id, body.route_id
	);

	state
		.orchestrator
		.confirm_replace(&body.user_id, &body.route_id, &body.old_poi_id, &body.new_poi_id)
		.await?;

	// confirm_replace mutates the cache in place; re-read it so the response
	// reflects the committed state rather than echoing the request.
	let entry = state
		.orchestrator
		.route_cache()
		.get(&body.user_id)
		.await?
		.ok_or_else(|| AppError::Public(PublicError::CacheMiss(format!("no cache entry for user {}", body.user_id))))?;
	let stops = entry
		.routes
		.get(&body.route_id)
		.cloned()
		.ok_or_else(|| AppError::Public(PublicError::CacheMiss(format!("no route {} for user {}", body.route_id, body.user_id))))?;

	Ok(Json(ConfirmReplaceResponse {
		status: "ok".to_string(),
		updated_route: UpdatedRoute { route_id: body.route_id, stops },
	}))
}

/// Rebuild a single cached route from a new query, keeping the same
/// `route_id` (§4.9's whole-route variant).
///
/// # Method
/// `POST /api/routes/replace-full`
pub async fn api_replace_full_route(
	State(state): State<AppState>,
	Json(body): Json<ReplaceFullRouteRequest>,
) -> ApiResult<Json<ReplaceFullRouteResponse>> {
	info!(
		"HANDLER ->> /api/routes/replace-full 'api_replace_full_route' - user_id: {}, route_id: {}",
		body.user_id, body.route_id
	);

	let mode = TransportMode::from_str(&body.mode).map_err(|e| AppError::Public(PublicError::BadRequest(e)))?;

	let req = PlanRequest {
		user: LatLon::new(body.user_location.lat, body.user_location.lon),
		mode,
		query: body.new_query,
		current_time: body.current_time,
		budget_minutes: body.max_time_minutes,
		target_stops: body.target_places,
		max_routes: 1,
		top_k_semantic: 10,
		customer_like: false,
	};

	let route = state.orchestrator.replace_full_route(&body.user_id, &body.route_id, req).await?;
	Ok(Json(ReplaceFullRouteResponse { route }))
}

/// Create the substitution routes.
///
/// # Routes
/// - `POST /replace-poi` - rank replacement candidates for one stop
/// - `POST /confirm-replace` - commit a chosen replacement
/// - `POST /replace-full` - rebuild a whole cached route
pub fn substitution_routes() -> Router<AppState> {
	Router::new()
		.route("/replace-poi", post(api_replace_poi))
		.route("/confirm-replace", post(api_confirm_replace))
		.route("/replace-full", post(api_replace_full_route))
}
