/*
 * src/http_models/substitution.rs
 *
 * Request/response DTOs for `replace_poi`, `confirm_replace`, and
 * `replace_full_route` (§6).
 */

use crate::cache::route_cache::RouteMembers;
use crate::model::poi::Poi;
use crate::model::route::Route;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UserLocation {
	pub lat: f64,
	pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct ReplacePoiRequest {
	pub user_id: String,
	pub route_id: String,
	pub old_poi_id: String,
	pub user_location: UserLocation,
	/// Carried on the wire per §6, but unused beyond input validation: the
	/// mode actually in effect for the route is read from the cache entry
	/// itself (§4.9), since a per-user entry only ever has one mode at a
	/// time (§3).
	pub mode: String,
	pub top_k: usize,
	pub current_time: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct ReplacementCandidateResponse {
	pub poi: Poi,
	pub score: f64,
	pub distance_delta_meters: f64,
	pub old_leg_minutes: f64,
	pub new_leg_minutes: f64,
}

#[derive(Debug, Serialize)]
pub struct ReplacePoiResponse {
	pub candidates: Vec<ReplacementCandidateResponse>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmReplaceRequest {
	pub user_id: String,
	pub route_id: String,
	pub old_poi_id: String,
	pub new_poi_id: String,
}

/// The route as it stands in the cache after a confirmed swap: the ordered
/// `(poi_id, category)` pairs (§3). `confirm_replace` mutates the cached
/// membership list in place; it does not recompute travel times or re-run
/// arrival validation, so this is not a full `Route` (§4.9 step on
/// `confirm_replace` names only the membership swap).
#[derive(Debug, Serialize)]
pub struct UpdatedRoute {
	pub route_id: String,
	pub stops: RouteMembers,
}

#[derive(Debug, Serialize)]
pub struct ConfirmReplaceResponse {
	pub status: String,
	pub updated_route: UpdatedRoute,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceFullRouteRequest {
	pub user_id: String,
	pub route_id: String,
	pub new_query: String,
	pub user_location: UserLocation,
	pub mode: String,
	pub max_time_minutes: f64,
	pub target_places: usize,
	pub current_time: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct ReplaceFullRouteResponse {
	pub route: Route,
}

#[derive(Debug, Serialize)]
pub struct VisitedPoisResponse {
	pub poi_ids: Vec<String>,
}
