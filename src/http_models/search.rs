/*
 * src/http_models/search.rs
 *
 * Request/response DTOs for `search_routes` (§6).
 */

use crate::model::route::Route;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SearchRoutesRequest {
	pub user_id: Option<String>,
	pub lat: f64,
	pub lon: f64,
	pub mode: String,
	pub query: String,
	pub current_time: Option<NaiveDateTime>,
	pub max_time_minutes: f64,
	pub target_places: usize,
	pub max_routes: usize,
	pub top_k_semantic: usize,
	#[serde(default)]
	pub customer_like: bool,
	#[serde(default)]
	pub delete_cache: bool,
	pub replace_route: Option<u32>,
}

/// A route as returned to the client, tagged with the cache key it was
/// stored under.
#[derive(Debug, Serialize)]
pub struct RouteEnvelope {
	pub route_id: String,
	#[serde(flatten)]
	pub route: Route,
}

/// Wall-clock cost of the request, broken down by pipeline stage (§2).
/// Shape is a presentation concern — nothing here feeds back into ranking.
#[derive(Debug, Serialize, Default)]
pub struct TimingBreakdown {
	pub candidate_acquisition_ms: u128,
	pub route_construction_ms: u128,
	pub total_ms: u128,
}

#[derive(Debug, Serialize)]
pub struct SearchRoutesResponse {
	pub routes: Vec<RouteEnvelope>,
	pub timing_breakdown: TimingBreakdown,
	pub warnings: Vec<String>,
}
