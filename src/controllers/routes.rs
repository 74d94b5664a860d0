/*
 * src/controllers/routes.rs
 *
 * File for Route Planning Controller API Endpoints
 *
 * Purpose:
 *   Serve the main planning request and the liveness probe.
 *
 * Include:
 *   api_search_routes  - POST /api/routes/search -> runs the planning pipeline
 *   api_healthz        - GET /healthz -> liveness probe (SPEC_FULL §B)
 */

use axum::{Json, Router, extract::State, routing::{get, post}};
use std::str::FromStr;
use tracing::info;

use crate::error::{ApiResult, AppError, PublicError};
use crate::geo::LatLon;
use crate::http_models::search::{RouteEnvelope, SearchRoutesRequest, SearchRoutesResponse, TimingBreakdown};
use crate::model::mode::TransportMode;
use crate::orchestrator::PlanRequest;
use crate::state::AppState;

/// Run the planning pipeline for one request.
///
/// # Method
/// `POST /api/routes/search`
///
/// # Responses
/// - `200 OK` - JSON body `SearchRoutesResponse`
/// - `400 BAD_REQUEST` - malformed mode string or a pipeline input error
/// - `422 UNPROCESSABLE_ENTITY` - every candidate filtered out before a route could be built
/// - `500 INTERNAL_SERVER_ERROR` - internal error
pub async fn api_search_routes(
	State(state): State<AppState>,
	Json(body): Json<SearchRoutesRequest>,
) -> ApiResult<Json<SearchRoutesResponse>> {
	info!("HANDLER ->> /api/routes/search 'api_search_routes' - user_id: {:?}", body.user_id);

	let mode = TransportMode::from_str(&body.mode)
		.map_err(|e| AppError::Public(PublicError::BadRequest(e)))?;

	let req = PlanRequest {
		user: LatLon::new(body.lat, body.lon),
		mode,
		query: body.query,
		current_time: body.current_time,
		budget_minutes: body.max_time_minutes,
		target_stops: body.target_places,
		max_routes: body.max_routes,
		top_k_semantic: body.top_k_semantic,
		customer_like: body.customer_like,
	};

	let outcome = state
		.orchestrator
		.search_routes(body.user_id.as_deref(), req, body.delete_cache, body.replace_route)
		.await?;

	let timing_breakdown = TimingBreakdown {
		candidate_acquisition_ms: outcome.candidate_acquisition_ms,
		route_construction_ms: outcome.route_construction_ms,
		total_ms: outcome.candidate_acquisition_ms + outcome.route_construction_ms,
	};

	let routes = outcome
		.routes
		.into_iter()
		.map(|planned| RouteEnvelope { route_id: planned.route_id, route: planned.route })
		.collect();

	Ok(Json(SearchRoutesResponse { routes, timing_breakdown, warnings: outcome.warnings }))
}

/// Liveness probe (SPEC_FULL §B). No dependency checks; a process that can
/// answer HTTP at all answers this.
///
/// # Method
/// `GET /healthz`
pub async fn api_healthz() -> &'static str {
	"ok"
}

/// Create the route-planning routes.
///
/// # Routes
/// - `POST /search` - run the planning pipeline
pub fn routes_routes() -> Router<AppState> {
	Router::new().route("/search", post(api_search_routes))
}

/// Create the top-level health route, unnested (no `/api` prefix, §B).
pub fn health_routes() -> Router<AppState> {
	Router::new().route("/healthz", get(api_healthz))
}
