/*
 * src/route_builder.rs
 *
 * Route builder (C6) — the hard kernel.
 *
 * Purpose:
 *   Greedy, position-dependent multi-criterion tour construction under a
 *   time budget: pick a first stop, fill middle stops under category
 *   interleaving and circular-direction constraints, pick a closing stop
 *   near the user, and do it `R` times over a (preferentially) disjoint
 *   pool (§4.6). This is CPU-bound and is meant to be run inside
 *   `tokio::task::spawn_blocking` by the caller (§5) — nothing in this
 *   module itself touches async I/O.
 */

use crate::geo::{LatLon, bearing, bearing_diff, circular_score, haversine, zigzag_score};
use crate::global::{self, CircularDirectionPreference, CLOSING_STOP_RHO_SEQUENCE, DEFAULT_STAY_MINUTES, DINNER_WINDOW, LUNCH_WINDOW};
use crate::model::mode::TransportMode;
use crate::model::poi::{Category, Poi};
use crate::model::route::{Route, Stop};
use chrono::{NaiveDateTime, NaiveTime};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
	Right,
	Left,
}

#[derive(Debug, Clone)]
pub struct BuildParams {
	pub user: LatLon,
	pub mode: TransportMode,
	pub budget_minutes: f64,
	pub target_stops: usize,
	pub max_routes: usize,
	pub current_time: Option<NaiveDateTime>,
	pub meal_anchored: bool,
}

struct Weights {
	d: f64,
	sim: f64,
	rat: f64,
	bear: f64,
}

const FIRST_WEIGHTS: Weights = Weights { d: 0.10, sim: 0.45, rat: 0.45, bear: 0.0 };
const MID_ZIGZAG_HIGH_SIM: Weights = Weights { d: 0.15, sim: 0.50, rat: 0.30, bear: 0.05 };
const MID_ZIGZAG_LOW_SIM: Weights = Weights { d: 0.25, sim: 0.10, rat: 0.40, bear: 0.25 };
const MID_CIRCULAR: Weights = Weights { d: 0.30, sim: 0.10, rat: 0.20, bear: 0.40 };
const LAST_ZIGZAG: Weights = Weights { d: 0.40, sim: 0.30, rat: 0.30, bear: 0.0 };
const LAST_CIRCULAR: Weights = Weights { d: 0.40, sim: 0.10, rat: 0.20, bear: 0.30 };

const SIMILARITY_HIGH_THRESHOLD: f64 = 0.8;

struct Matrix {
	points: Vec<LatLon>, // index 0 = user, 1..=n = pool in order
	dist_km: Vec<Vec<f64>>,
	time_min: Vec<Vec<f64>>,
}

fn build_matrix(user: LatLon, pool: &[Poi], speed_kmh: f64) -> Matrix {
	let mut points = Vec::with_capacity(pool.len() + 1);
	points.push(user);
	points.extend(pool.iter().map(|p| LatLon::new(p.lat, p.lon)));

	let n = points.len();
	let mut dist_km = vec![vec![0.0; n]; n];
	let mut time_min = vec![vec![0.0; n]; n];
	for i in 0..n {
		for j in 0..n {
			if i == j {
				continue;
			}
			let km = haversine(points[i], points[j]) / 1000.0;
			dist_km[i][j] = km;
			time_min[i][j] = km / speed_kmh * 60.0;
		}
	}
	Matrix { points, dist_km, time_min }
}

/// Entry point (§4.6). `pool` must already be the hydrated, deduplicated
/// union of the spatial and semantic candidate pools.
pub fn build_routes(pool: &[Poi], params: &BuildParams) -> Vec<Route> {
	if params.budget_minutes <= 0.0 || pool.is_empty() || params.target_stops == 0 {
		return Vec::new();
	}

	let profile = global::mode_profile(params.mode);
	let matrix = build_matrix(params.user, pool, profile.speed_kmh);
	let id_index: HashMap<&str, usize> = pool.iter().enumerate().map(|(i, p)| (p.id.as_str(), i)).collect();

	let mut remaining: HashSet<usize> = (0..pool.len()).collect();
	let mut routes = Vec::with_capacity(params.max_routes);

	for _ in 0..params.max_routes {
		let working: HashSet<usize> = if remaining.len() >= params.target_stops.max(1) {
			remaining.clone()
		} else {
			// Candidate pool exhausted for disjoint selection; fall back to
			// the full pool so later routes can still reach `target_stops`
			// by repeating earlier selections (§4.6.6 step 6).
			(0..pool.len()).collect()
		};

		let route = build_one_route(pool, &matrix, &working, profile.radius_km, params);
		if route.stops.is_empty() {
			break;
		}
		for stop in &route.stops {
			if let Some(&idx) = id_index.get(stop.poi_id.as_str()) {
				remaining.remove(&idx);
			}
		}
		routes.push(route);
	}

	routes
}

fn build_one_route(
	pool: &[Poi],
	matrix: &Matrix,
	available: &HashSet<usize>,
	r_max_km: f64,
	params: &BuildParams,
) -> Route {
	let mut route = Route::empty();
	let mut used: HashSet<usize> = HashSet::new();
	let mut remaining_budget = params.budget_minutes;
	let mut total_score = 0.0;

	let Some((first_idx, first_score)) = pick_first_stop(pool, matrix, available, r_max_km) else {
		return route;
	};
	let first_travel = matrix.time_min[0][first_idx + 1];
	let first_stay = stay_minutes(&pool[first_idx].category);
	if first_travel + first_stay > remaining_budget {
		return route;
	}

	remaining_budget -= first_travel + first_stay;
	total_score += first_score;
	used.insert(first_idx);
	route.stops.push(make_stop(pool, first_idx, 0, first_travel, first_stay, false));

	let mut prev_idx = first_idx;
	let mut prev_bearing = bearing(params.user, matrix.points[first_idx + 1]);
	let mut prev_category = pool[first_idx].category.clone();
	let mut direction_lock: Option<Direction> = match global::CIRCULAR_DIRECTION_PREFERENCE {
		CircularDirectionPreference::Right => Some(Direction::Right),
		CircularDirectionPreference::Left => Some(Direction::Left),
		CircularDirectionPreference::Auto => None,
	};
	let mut meal_anchor_inserted = !params.meal_anchored;
	// Tracks departure time from the last processed stop, so it lines up with
	// the `cursor_time += travel + stay` update at the bottom of the loop
	// below — the projected arrival the meal-anchor check (§4.6.4) probes.
	let mut cursor_time =
		params.current_time.map(|t| t + chrono::Duration::minutes((first_travel + first_stay).round() as i64));

	if params.target_stops == 1 {
		route.total_score = total_score;
		route.recompute_totals();
		return route;
	}

	let middle_count = params.target_stops.saturating_sub(2);
	let mut truncated = false;

	for _ in 0..middle_count {
		let from_point = matrix.points[prev_idx + 1];

		let free: Vec<usize> = available.iter().copied().filter(|i| !used.contains(i)).collect();
		if free.is_empty() {
			truncated = true;
			break;
		}

		let meal_slot = !meal_anchor_inserted
			&& cursor_time.map(in_meal_window).unwrap_or(false)
			&& free.iter().any(|&i| pool[i].category == Category::Restaurant);

		let mut candidates: Vec<usize> = if meal_slot {
			free.iter().copied().filter(|&i| pool[i].category == Category::Restaurant).collect()
		} else {
			category_filter(&free, pool, &prev_category)
		};

		if global::USE_CIRCULAR_ROUTING {
			let locked = *direction_lock.get_or_insert_with(|| {
				auto_lock_direction(&candidates, pool, matrix, from_point, prev_bearing)
			});
			let directional = direction_filter(&candidates, pool, matrix, from_point, prev_bearing, locked);
			if !directional.is_empty() {
				candidates = directional;
			}
		}

		if candidates.is_empty() {
			truncated = true;
			break;
		}

		let scored: Vec<(usize, f64, f64, f64)> = candidates
			.iter()
			.filter(|&&i| {
				let travel = matrix.time_min[prev_idx + 1][i + 1];
				let stay = stay_minutes(&pool[i].category);
				travel + stay <= remaining_budget
			})
			.map(|&i| {
				let travel_ok_score = score_middle(pool, matrix, from_point, prev_bearing, i, r_max_km);
				(i, travel_ok_score, pool[i].similarity_or_default(), pool[i].rating_score)
			})
			.collect();

		let Some(chosen) = pick_best(&scored, pool) else {
			truncated = true;
			break;
		};

		let travel = matrix.time_min[prev_idx + 1][chosen + 1];
		let stay = stay_minutes(&pool[chosen].category);
		let score = scored.iter().find(|(i, ..)| *i == chosen).map(|(_, s, ..)| *s).unwrap_or(0.0);

		remaining_budget -= travel + stay;
		total_score += score;
		used.insert(chosen);
		route
			.stops
			.push(make_stop(pool, chosen, route.stops.len(), travel, stay, meal_slot));
		if meal_slot {
			meal_anchor_inserted = true;
		}

		prev_bearing = bearing(from_point, matrix.points[chosen + 1]);
		prev_category = pool[chosen].category.clone();
		cursor_time = cursor_time.map(|t| t + chrono::Duration::minutes((travel + stay).round() as i64));
		prev_idx = chosen;
	}

	if !truncated {
		let from_point = matrix.points[prev_idx + 1];
		let free: Vec<usize> = available.iter().copied().filter(|i| !used.contains(i)).collect();

		if let Some((closing_idx, closing_score)) =
			pick_closing_stop(pool, matrix, &free, params.user, from_point, prev_bearing, r_max_km, remaining_budget, prev_idx)
		{
			let travel = matrix.time_min[prev_idx + 1][closing_idx + 1];
			let stay = stay_minutes(&pool[closing_idx].category);
			total_score += closing_score;
			route
				.stops
				.push(make_stop(pool, closing_idx, route.stops.len(), travel, stay, false));
		}
	}

	route.total_score = total_score;
	route.recompute_totals();
	route
}

fn make_stop(pool: &[Poi], idx: usize, order_index: usize, travel: f64, stay: f64, meal_anchored: bool) -> Stop {
	let poi = &pool[idx];
	Stop {
		poi_id: poi.id.clone(),
		name: poi.name.clone(),
		category: poi.category.clone(),
		lat: poi.lat,
		lon: poi.lon,
		order_index,
		travel_minutes_from_previous: travel,
		stay_minutes: stay,
		arrival_time: None,
		hours_summary: None,
		meal_anchored,
	}
}

fn stay_minutes(_category: &Category) -> f64 {
	DEFAULT_STAY_MINUTES
}

fn pick_first_stop(pool: &[Poi], matrix: &Matrix, available: &HashSet<usize>, r_max_km: f64) -> Option<(usize, f64)> {
	let scored: Vec<(usize, f64, f64, f64)> = available
		.iter()
		.map(|&i| {
			let d_score = 1.0 - (matrix.dist_km[0][i + 1] / r_max_km).clamp(0.0, 1.0);
			let score = FIRST_WEIGHTS.d * d_score
				+ FIRST_WEIGHTS.sim * pool[i].similarity_or_default()
				+ FIRST_WEIGHTS.rat * pool[i].rating_score;
			(i, score, pool[i].similarity_or_default(), pool[i].rating_score)
		})
		.collect();
	pick_best(&scored, pool).map(|i| {
		let score = scored.iter().find(|(idx, ..)| *idx == i).map(|(_, s, ..)| *s).unwrap_or(0.0);
		(i, score)
	})
}

fn score_middle(pool: &[Poi], matrix: &Matrix, from: LatLon, prev_bearing: f64, idx: usize, r_max_km: f64) -> f64 {
	let d_score = 1.0 - (haversine(from, matrix.points[idx + 1]) / 1000.0 / r_max_km).clamp(0.0, 1.0);
	let sim = pool[idx].similarity_or_default();
	let rat = pool[idx].rating_score;
	let now_bearing = bearing(from, matrix.points[idx + 1]);

	let weights = if global::USE_CIRCULAR_ROUTING {
		&MID_CIRCULAR
	} else if sim >= SIMILARITY_HIGH_THRESHOLD {
		&MID_ZIGZAG_HIGH_SIM
	} else {
		&MID_ZIGZAG_LOW_SIM
	};

	let bear_score = if global::USE_CIRCULAR_ROUTING {
		circular_score(prev_bearing, now_bearing)
	} else {
		zigzag_score(prev_bearing, now_bearing)
	};

	weights.d * d_score + weights.sim * sim + weights.rat * rat + weights.bear * bear_score
}

#[allow(clippy::too_many_arguments)]
fn pick_closing_stop(
	pool: &[Poi],
	matrix: &Matrix,
	free: &[usize],
	user: LatLon,
	from: LatLon,
	prev_bearing: f64,
	r_max_km: f64,
	remaining_budget: f64,
	prev_idx: usize,
) -> Option<(usize, f64)> {
	for rho in CLOSING_STOP_RHO_SEQUENCE {
		let threshold_km = rho * r_max_km;
		let qualifying: Vec<usize> = free
			.iter()
			.copied()
			.filter(|&i| haversine(user, matrix.points[i + 1]) / 1000.0 <= threshold_km)
			.filter(|&i| {
				let travel = matrix.time_min[prev_idx + 1][i + 1];
				travel + stay_minutes(&pool[i].category) <= remaining_budget
			})
			.collect();
		if qualifying.is_empty() {
			continue;
		}

		let weights = if global::USE_CIRCULAR_ROUTING { &LAST_CIRCULAR } else { &LAST_ZIGZAG };
		let scored: Vec<(usize, f64, f64, f64)> = qualifying
			.iter()
			.map(|&i| {
				let d_score = 1.0 - (haversine(from, matrix.points[i + 1]) / 1000.0 / r_max_km).clamp(0.0, 1.0);
				let sim = pool[i].similarity_or_default();
				let rat = pool[i].rating_score;
				let bear_score = if global::USE_CIRCULAR_ROUTING {
					circular_score(prev_bearing, bearing(from, matrix.points[i + 1]))
				} else {
					0.0
				};
				let score = weights.d * d_score + weights.sim * sim + weights.rat * rat + weights.bear * bear_score;
				(i, score, sim, rat)
			})
			.collect();

		if let Some(chosen) = pick_best(&scored, pool) {
			let score = scored.iter().find(|(idx, ..)| *idx == chosen).map(|(_, s, ..)| *s).unwrap_or(0.0);
			return Some((chosen, score));
		}
	}
	None
}

fn category_filter(available: &[usize], pool: &[Poi], prev_category: &Category) -> Vec<usize> {
	let other: Vec<usize> = available.iter().copied().filter(|&i| pool[i].category != *prev_category).collect();
	if other.is_empty() { available.to_vec() } else { other }
}

fn bearing_cone_side(candidate_bearing: f64, prev_bearing: f64) -> Direction {
	let right_target = (prev_bearing + 90.0) % 360.0;
	let left_target = (prev_bearing + 270.0) % 360.0;
	if bearing_diff(candidate_bearing, right_target) <= bearing_diff(candidate_bearing, left_target) {
		Direction::Right
	} else {
		Direction::Left
	}
}

fn auto_lock_direction(candidates: &[usize], pool: &[Poi], matrix: &Matrix, from: LatLon, prev_bearing: f64) -> Direction {
	let (mut right, mut left) = (0usize, 0usize);
	for &i in candidates {
		let b = bearing(from, matrix.points[i + 1]);
		match bearing_cone_side(b, prev_bearing) {
			Direction::Right => right += 1,
			Direction::Left => left += 1,
		}
	}
	let _ = pool;
	if left > right { Direction::Left } else { Direction::Right }
}

fn direction_filter(
	candidates: &[usize],
	_pool: &[Poi],
	matrix: &Matrix,
	from: LatLon,
	prev_bearing: f64,
	locked: Direction,
) -> Vec<usize> {
	let target = match locked {
		Direction::Right => (prev_bearing + 90.0) % 360.0,
		Direction::Left => (prev_bearing + 270.0) % 360.0,
	};
	candidates
		.iter()
		.copied()
		.filter(|&i| {
			let b = bearing(from, matrix.points[i + 1]);
			bearing_diff(b, target) <= global::CIRCULAR_ANGLE_TOLERANCE_DEG
		})
		.collect()
}

fn pick_best(scored: &[(usize, f64, f64, f64)], pool: &[Poi]) -> Option<usize> {
	scored
		.iter()
		.copied()
		.reduce(|a, b| {
			let (ia, sa, sim_a, ra) = a;
			let (ib, sb, sim_b, rb) = b;
			if sb > sa {
				b
			} else if sa > sb {
				a
			} else if sim_b > sim_a {
				b
			} else if sim_a > sim_b {
				a
			} else if rb > ra {
				b
			} else if ra > rb {
				a
			} else if pool[ib].id < pool[ia].id {
				b
			} else {
				a
			}
		})
		.map(|(i, ..)| i)
}

/// Whether `at` falls within the configured lunch or dinner window on its
/// own calendar day (used only by the meal-anchor decision in §4.6.4; the
/// query-level decision of whether to inject Restaurant at all is C5's).
fn in_meal_window(at: NaiveDateTime) -> bool {
	[LUNCH_WINDOW, DINNER_WINDOW].into_iter().any(|(from, to)| {
		let start = NaiveTime::parse_from_str(from, "%H:%M").expect("meal window constants are valid");
		let end = NaiveTime::parse_from_str(to, "%H:%M").expect("meal window constants are valid");
		at.time() >= start && at.time() <= end
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::hours::OpeningHours;

	fn poi(id: &str, lat: f64, lon: f64, category: Category, sim: f64, rating: f64) -> Poi {
		Poi {
			id: id.to_string(),
			name: id.to_string(),
			lat,
			lon,
			address: String::new(),
			category,
			rating_score: rating,
			opening_hours: OpeningHours::always_open(),
			similarity_score: Some(sim),
		}
	}

	#[test]
	fn zero_budget_produces_no_routes() {
		let pool = vec![poi("a", 10.81, 106.77, Category::Restaurant, 0.5, 0.5)];
		let params = BuildParams {
			user: LatLon::new(10.80, 106.77),
			mode: TransportMode::Walking,
			budget_minutes: 0.0,
			target_stops: 3,
			max_routes: 1,
			current_time: None,
			meal_anchored: false,
		};
		assert!(build_routes(&pool, &params).is_empty());
	}

	#[test]
	fn pool_smaller_than_target_never_panics_and_truncates() {
		let pool = vec![
			poi("a", 10.801, 106.771, Category::Restaurant, 0.9, 0.9),
			poi("b", 10.802, 106.772, Category::Bar, 0.8, 0.8),
		];
		let params = BuildParams {
			user: LatLon::new(10.80, 106.77),
			mode: TransportMode::Walking,
			budget_minutes: 600.0,
			target_stops: 5,
			max_routes: 1,
			current_time: None,
			meal_anchored: false,
		};
		let routes = build_routes(&pool, &params);
		assert_eq!(routes.len(), 1);
		assert!(routes[0].stops.len() <= pool.len());
	}

	#[test]
	fn single_target_stop_skips_closing_rules() {
		let pool = vec![poi("a", 10.801, 106.771, Category::Restaurant, 0.9, 0.9)];
		let params = BuildParams {
			user: LatLon::new(10.80, 106.77),
			mode: TransportMode::Walking,
			budget_minutes: 600.0,
			target_stops: 1,
			max_routes: 1,
			current_time: None,
			meal_anchored: false,
		};
		let routes = build_routes(&pool, &params);
		assert_eq!(routes.len(), 1);
		assert_eq!(routes[0].stops.len(), 1);
	}

	#[test]
	fn routes_are_disjoint_when_pool_allows() {
		let pool: Vec<Poi> = (0..8)
			.map(|i| {
				poi(
					&format!("p{i}"),
					10.80 + 0.001 * i as f64,
					106.77 + 0.001 * i as f64,
					if i % 2 == 0 { Category::Restaurant } else { Category::Bar },
					0.5,
					0.5,
				)
			})
			.collect();
		let params = BuildParams {
			user: LatLon::new(10.80, 106.77),
			mode: TransportMode::Walking,
			budget_minutes: 1000.0,
			target_stops: 3,
			max_routes: 2,
			current_time: None,
			meal_anchored: false,
		};
		let routes = build_routes(&pool, &params);
		assert_eq!(routes.len(), 2);
		let ids_a: HashSet<&str> = routes[0].stops.iter().map(|s| s.poi_id.as_str()).collect();
		let ids_b: HashSet<&str> = routes[1].stops.iter().map(|s| s.poi_id.as_str()).collect();
		assert!(ids_a.is_disjoint(&ids_b));
	}

	/// §4.6.4 / §8 scenario 2: the meal-anchor Restaurant must land at the
	/// first index whose projected arrival actually falls inside the meal
	/// window, not unconditionally at the first middle step.
	#[test]
	fn meal_anchor_waits_for_the_in_window_slot() {
		let current_time = chrono::NaiveDate::from_ymd_opt(2026, 2, 5)
			.unwrap()
			.and_hms_opt(10, 0, 0)
			.unwrap();

		let pool = vec![
			poi("first", 10.8001, 106.7700, Category::Bar, 0.9, 0.9),
			poi("mid1", 10.8001, 106.79743, Category::CafeAndBakery, 0.8, 0.8),
			poi("rest", 10.8001, 106.8251, Category::Restaurant, 0.1, 0.1),
			poi("closing", 10.8000, 106.7701, Category::Bar, 0.5, 0.5),
		];
		let params = BuildParams {
			user: LatLon::new(10.80, 106.77),
			mode: TransportMode::Walking,
			budget_minutes: 600.0,
			target_stops: 4,
			max_routes: 1,
			current_time: Some(current_time),
			meal_anchored: true,
		};

		let routes = build_routes(&pool, &params);
		assert_eq!(routes.len(), 1);
		let stops = &routes[0].stops;
		assert!(stops.len() >= 3, "expected at least first/mid1/rest stops, got {stops:?}");

		// Not forced into the very first middle slot: cursor time there is
		// still well before the lunch window.
		assert_eq!(stops[1].poi_id, "mid1");
		assert!(!stops[1].meal_anchored);

		// Forced in once the projected arrival enters the lunch window.
		assert_eq!(stops[2].poi_id, "rest");
		assert!(stops[2].meal_anchored);
	}
}
