/*
 * src/substitution.rs
 *
 * Substitution service (C9).
 *
 * Purpose:
 *   Replaces one stop in a cached route with an alternative of the same
 *   category without rebuilding the rest of the route (§4.9). Reads and
 *   writes the per-user cache entry (C8); `confirm_replace` is the only
 *   read-modify-write in the system and is not transactional across
 *   concurrent callers (§5) — a re-read before write surfaces a conflict
 *   instead of silently clobbering a concurrent confirm.
 */

use crate::cache::route_cache::{RouteCache, UserCacheEntry};
use crate::error::{AppError, PublicError};
use crate::geo::{LatLon, haversine};
use crate::model::poi::{Category, Poi};
use crate::sql_models::poi::rows_into_pois;
use crate::poi_store::PoiStore;
use chrono::NaiveDateTime;

/// One ranked replacement candidate, annotated with the travel deltas the
/// swap would introduce on its two incident legs (§4.9 step 4).
#[derive(Debug, Clone)]
pub struct ReplacementCandidate {
	pub poi: Poi,
	pub score: f64,
	pub distance_delta_meters: f64,
	pub old_leg_minutes: f64,
	pub new_leg_minutes: f64,
}

pub struct SubstitutionService {
	route_cache: RouteCache,
	poi_store: PoiStore,
}

impl SubstitutionService {
	pub fn new(route_cache: RouteCache, poi_store: PoiStore) -> Self {
		SubstitutionService { route_cache, poi_store }
	}

	/// **replace_poi** (§4.9).
	pub async fn replace_poi(
		&self,
		user_id: &str,
		route_id: &str,
		old_poi_id: &str,
		user_location: LatLon,
		top_k: usize,
		current_time: Option<NaiveDateTime>,
	) -> Result<Vec<ReplacementCandidate>, AppError> {
		let entry = self
			.route_cache
			.get(user_id)
			.await?
			.ok_or_else(|| AppError::Public(PublicError::CacheMiss(format!("no cache entry for user {user_id}"))))?;

		let members = entry
			.routes
			.get(route_id)
			.ok_or_else(|| AppError::Public(PublicError::CacheMiss(format!("no route {route_id} for user {user_id}"))))?;

		let target_index = members
			.iter()
			.position(|(id, _)| id == old_poi_id)
			.ok_or_else(|| AppError::Public(PublicError::CacheMiss(format!("POI {old_poi_id} not in route {route_id}"))))?;

		let category = members[target_index].1.clone();

		// Step 2: substitution pool = available[category] - (already_substituted[category] ∪ every routed id).
		let already_substituted = entry.already_substituted.get(&category).cloned().unwrap_or_default();
		let routed = entry.all_routed_ids();
		let candidate_ids: Vec<String> = entry
			.available
			.get(&category)
			.map(|set| {
				set.iter()
					.filter(|id| !already_substituted.contains(*id) && !routed.contains(*id))
					.cloned()
					.collect()
			})
			.unwrap_or_default();

		if candidate_ids.is_empty() {
			return Err(AppError::Public(PublicError::Exhausted {
				filter: format!("available[{category}] after excluding substituted/routed ids"),
			}));
		}

		let rows = self.poi_store.fetch_by_ids(&candidate_ids).await?;
		let mut candidates = rows_into_pois(rows);

		if let Some(now) = current_time {
			candidates.retain(|poi| poi.opening_hours.is_open_at(now));
		}
		if candidates.is_empty() {
			return Err(AppError::Public(PublicError::Exhausted {
				filter: "open-at-current_time".to_string(),
			}));
		}

		// The incident legs at the target index: the previous stop (or the
		// user's own position, if the old POI was the first stop) and the
		// next stop (or the user's position again, if it was the last).
		let neighbor_ids: Vec<String> = [
			members.get(target_index.wrapping_sub(1)).filter(|_| target_index > 0),
			members.get(target_index + 1),
		]
		.into_iter()
		.flatten()
		.map(|(id, _)| id.clone())
		.collect();
		let neighbor_rows = self.poi_store.fetch_by_ids(&neighbor_ids).await?;
		let neighbor_points: std::collections::HashMap<String, LatLon> = neighbor_rows
			.iter()
			.map(|row| (row.id.clone(), LatLon::new(row.lat, row.lon)))
			.collect();

		let prev_point = if target_index == 0 {
			user_location
		} else {
			members
				.get(target_index - 1)
				.and_then(|(id, _)| neighbor_points.get(id))
				.copied()
				.unwrap_or(user_location)
		};
		let next_point = members
			.get(target_index + 1)
			.and_then(|(id, _)| neighbor_points.get(id))
			.copied();

		let old_row = self.poi_store.fetch_by_ids(std::slice::from_ref(&old_poi_id.to_string())).await?;
		let old_point = old_row.first().map(|row| LatLon::new(row.lat, row.lon)).unwrap_or(user_location);
		let old_reference_km = reference_distance_km(prev_point, next_point, old_point);
		let speed_kmh = crate::global::mode_profile(entry.mode).speed_kmh;

		let distances: Vec<f64> = candidates
			.iter()
			.map(|p| reference_distance_km(prev_point, next_point, LatLon::new(p.lat, p.lon)))
			.collect();
		let max_distance_km = distances.iter().cloned().fold(0.0_f64, f64::max).max(1.0);

		let mut scored: Vec<ReplacementCandidate> = candidates
			.into_iter()
			.zip(distances)
			.map(|(poi, reference_km)| {
				let normalized_distance = (reference_km / max_distance_km).clamp(0.0, 1.0);
				let score = 0.6 * poi.rating_score + 0.4 * (1.0 - normalized_distance);
				let new_point = LatLon::new(poi.lat, poi.lon);
				ReplacementCandidate {
					distance_delta_meters: (reference_km - old_reference_km) * 1000.0,
					old_leg_minutes: old_reference_km / speed_kmh * 60.0,
					new_leg_minutes: (haversine(prev_point, new_point) / 1000.0) / speed_kmh * 60.0,
					poi,
					score,
				}
			})
			.collect();

		scored.sort_by(|a, b| b.score.partial_cmp(&a.score).expect("scores are never NaN"));
		scored.truncate(top_k);
		Ok(scored)
	}

	/// **confirm_replace** (§4.9).
	pub async fn confirm_replace(
		&self,
		user_id: &str,
		route_id: &str,
		old_poi_id: &str,
		new_poi_id: &str,
	) -> Result<(), AppError> {
		let mut entry = self
			.route_cache
			.get(user_id)
			.await?
			.ok_or_else(|| AppError::Public(PublicError::CacheMiss(format!("no cache entry for user {user_id}"))))?;

		let members = entry
			.routes
			.get_mut(route_id)
			.ok_or_else(|| AppError::Public(PublicError::CacheMiss(format!("no route {route_id} for user {user_id}"))))?;

		let position = members
			.iter()
			.position(|(id, _)| id == old_poi_id)
			.ok_or_else(|| {
				AppError::Public(PublicError::Conflict(format!(
					"POI {old_poi_id} is no longer at the expected position in route {route_id}"
				)))
			})?;

		let category = members[position].1.clone();
		members[position] = (new_poi_id.to_string(), category.clone());

		move_to_substituted(&mut entry, &category, old_poi_id);
		entry.remove_from_available(&category, new_poi_id);

		self.route_cache.put(user_id, &entry).await
	}
}

/// Mean of distance-from-prev and distance-to-next at the target index
/// (§4.9 step 4); falls back to the single available leg at a route end.
fn reference_distance_km(prev: LatLon, next: Option<LatLon>, point: LatLon) -> f64 {
	let prev_km = haversine(prev, point) / 1000.0;
	match next {
		Some(next) => (prev_km + haversine(next, point) / 1000.0) / 2.0,
		None => prev_km,
	}
}

fn move_to_substituted(entry: &mut UserCacheEntry, category: &Category, old_poi_id: &str) {
	entry
		.already_substituted
		.entry(category.clone())
		.or_default()
		.insert(old_poi_id.to_string());
	if let Some(set) = entry.available.get_mut(category) {
		set.remove(old_poi_id);
	}
}
