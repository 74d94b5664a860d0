/*
 * src/controllers/poi.rs
 *
 * File for POI Controller API Endpoints
 *
 * Purpose:
 *   Serve read-through requests against the POI store that bypass the
 *   planning pipeline entirely (SPEC_FULL §B).
 *
 * Include:
 *   api_get_poi           - GET /api/pois/:id -> single hydrated POI
 *   api_get_visited_pois  - GET /api/pois/visited/:user_id -> ids a collaborator marked visited
 */

use axum::{Json, Router, extract::{Path, State}, routing::get};
use tracing::info;

use crate::error::{ApiResult, AppError, PublicError};
use crate::http_models::substitution::VisitedPoisResponse;
use crate::model::poi::Poi;
use crate::state::AppState;

/// Get a single POI by id.
///
/// # Method
/// `GET /api/pois/:id`
///
/// # Responses
/// - `200 OK` - JSON body `Poi`
/// - `404 NOT_FOUND` - no POI with that id
pub async fn api_get_poi(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Poi>> {
	info!("HANDLER ->> /api/pois/{} 'api_get_poi'", id);

	let row = state
		.poi_store
		.fetch_one(&id)
		.await?
		.ok_or_else(|| AppError::Public(PublicError::NotFound(format!("no POI with id {id}"))))?;

	Ok(Json(row.into()))
}

/// Get the ids of POIs a collaborator has already recorded as visited by
/// this user (§6). The engine does not compute visited status itself — it
/// only reads what another service already wrote.
///
/// # Method
/// `GET /api/pois/visited/:user_id`
pub async fn api_get_visited_pois(
	State(state): State<AppState>,
	Path(user_id): Path<String>,
) -> ApiResult<Json<VisitedPoisResponse>> {
	info!("HANDLER ->> /api/pois/visited/{} 'api_get_visited_pois'", user_id);

	let poi_ids = state.poi_store.fetch_visited_poi_ids(&user_id).await?;
	Ok(Json(VisitedPoisResponse { poi_ids }))
}

/// Create the POI read-through routes.
///
/// # Routes
/// - `GET /:id` - single hydrated POI
/// - `GET /visited/:user_id` - visited POI ids for a user
pub fn poi_routes() -> Router<AppState> {
	Router::new()
		.route("/visited/{user_id}", get(api_get_visited_pois))
		.route("/{id}", get(api_get_poi))
}
