/*
 * src/orchestrator.rs
 *
 * Orchestrator (C10).
 *
 * Purpose:
 *   Composes the end-to-end pipeline for a planning request: query
 *   expansion (C5) -> parallel spatial/semantic candidate acquisition
 *   (C3/C4) -> pool union + hydration -> opening-hours window filter (C1)
 *   -> route construction (C6, offloaded to a blocking worker per §5) ->
 *   arrival validation (C7) -> per-user cache write (C8). Also implements
 *   the "delete_cache" and "replace_route N" request-level variants (§4.10)
 *   and forwards substitution calls to C9.
 *
 *   Cache writes are the last step of a successful request (§7): any
 *   earlier failure returns before `route_cache.put` is reached, so the
 *   per-user cache is never left half-written.
 */

use crate::cache::route_cache::{RouteCache, RouteMembers, UserCacheEntry};
use crate::candidates::semantic::SemanticCandidateSource;
use crate::candidates::spatial::SpatialCandidateSource;
use crate::candidates::{CandidateRequest, CandidateSource};
use crate::error::{AppError, PrivateError, PublicError};
use crate::geo::LatLon;
use crate::model::mode::TransportMode;
use crate::model::poi::{Category, Poi};
use crate::model::route::Route;
use crate::poi_store::PoiStore;
use crate::query_expander;
use crate::route_builder::{self, BuildParams};
use crate::substitution::{ReplacementCandidate, SubstitutionService};
use crate::arrival;
use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};

/// Parameters common to both `search_routes` and the full-route-replacement
/// variant of C9 — everything needed to run C5 through C7 once.
pub struct PlanRequest {
	pub user: LatLon,
	pub mode: TransportMode,
	pub query: String,
	pub current_time: Option<NaiveDateTime>,
	pub budget_minutes: f64,
	pub target_stops: usize,
	pub max_routes: usize,
	pub top_k_semantic: usize,
	pub customer_like: bool,
}

/// One planned-and-validated route plus the id it will be cached under.
pub struct PlannedRoute {
	pub route_id: String,
	pub route: Route,
}

pub struct PlanOutcome {
	pub routes: Vec<PlannedRoute>,
	pub warnings: Vec<String>,
	/// The full hydrated candidate pool this plan drew from, kept so the
	/// caller can populate the per-user cache's `available[category]`
	/// bookkeeping (§3, §4.8) with every POI the search surfaced but did
	/// not route.
	pool: Vec<Poi>,
	pub candidate_acquisition_ms: u128,
	pub route_construction_ms: u128,
}

pub struct Orchestrator {
	// Both sides of the §9 "tagged variants" candidate-source abstraction:
	// the orchestrator consumes spatial and semantic acquisition uniformly
	// through `CandidateSource::produce`, rather than matching on concrete
	// producer types.
	spatial: CandidateSource,
	semantic: CandidateSource,
	poi_store: PoiStore,
	route_cache: RouteCache,
	substitution: SubstitutionService,
}

impl Orchestrator {
	pub fn new(
		spatial: SpatialCandidateSource,
		semantic: SemanticCandidateSource,
		poi_store: PoiStore,
		route_cache: RouteCache,
	) -> Self {
		let substitution = SubstitutionService::new(route_cache.clone(), poi_store.clone());
		Orchestrator {
			spatial: CandidateSource::Spatial(spatial),
			semantic: CandidateSource::Semantic(semantic),
			poi_store,
			route_cache,
			substitution,
		}
	}

	/// Runs C5 -> C3+C4 -> C6 -> C7 and returns validated routes, without
	/// touching the cache. Shared by `search_routes` and
	/// `replace_full_route` (§4.9, §4.10).
	async fn plan(&self, req: &PlanRequest) -> Result<PlanOutcome, AppError> {
		if req.top_k_semantic == 0 {
			return Err(AppError::Public(PublicError::BadRequest(
				"top_k_semantic must be > 0".to_string(),
			)));
		}

		let expanded = query_expander::expand(&req.query, req.customer_like, req.current_time, req.budget_minutes);
		let window = req
			.current_time
			.map(|start| (start, start + chrono::Duration::minutes(req.budget_minutes.round() as i64)));
		let semantic_text = if expanded.categories.is_empty() {
			req.query.clone()
		} else {
			expanded
				.categories
				.iter()
				.map(Category::as_str)
				.collect::<Vec<_>>()
				.join(", ")
		};

		let acquisition_start = std::time::Instant::now();
		// C3 and C4 run concurrently; each is its own suspension point (§5).
		// Both requests go through the shared `produce` entry point (§9) so
		// the orchestrator never matches on the concrete producer type.
		let (spatial_pois, semantic_pois) = tokio::try_join!(
			self.spatial.produce(CandidateRequest::Spatial {
				lat: req.user.lat,
				lon: req.user.lon,
				mode: req.mode,
				window,
			}),
			self.semantic.produce(CandidateRequest::Semantic {
				text: semantic_text,
				top_k: req.top_k_semantic,
				id_filter: None,
				category: None,
			}),
		)?;

		let mut similarity_by_id: HashMap<String, f64> = HashMap::new();
		let mut seen: HashSet<String> = HashSet::new();
		let mut ids: Vec<String> = Vec::new();
		for poi in &spatial_pois {
			if seen.insert(poi.id.clone()) {
				ids.push(poi.id.clone());
			}
		}
		for poi in &semantic_pois {
			if let Some(sim) = poi.similarity_score {
				similarity_by_id.insert(poi.id.clone(), sim);
			}
			if seen.insert(poi.id.clone()) {
				ids.push(poi.id.clone());
			}
		}

		if ids.is_empty() {
			return Err(AppError::Public(PublicError::Exhausted {
				filter: "spatial ∪ semantic candidate pool".to_string(),
			}));
		}

		let rows = self.poi_store.fetch_by_ids(&ids).await?;
		let mut pool = crate::sql_models::poi::rows_into_pois(rows);
		for poi in &mut pool {
			if let Some(sim) = similarity_by_id.get(&poi.id) {
				poi.similarity_score = Some(*sim);
			}
		}
		if let Some((a, b)) = window {
			pool.retain(|p| p.opening_hours.overlaps_window(a, b));
		}
		if pool.is_empty() {
			return Err(AppError::Public(PublicError::Exhausted {
				filter: "opening-hours window overlap".to_string(),
			}));
		}

		let candidate_acquisition_ms = acquisition_start.elapsed().as_millis();

		let hours_by_poi_id: HashMap<String, crate::hours::OpeningHours> =
			pool.iter().map(|p| (p.id.clone(), p.opening_hours.clone())).collect();

		let build_params = BuildParams {
			user: req.user,
			mode: req.mode,
			budget_minutes: req.budget_minutes,
			target_stops: req.target_stops,
			max_routes: req.max_routes,
			current_time: req.current_time,
			meal_anchored: expanded.meal_anchored,
		};

		// C6 is CPU-bound; it must not stall the event loop (§5).
		let pool_for_cache = pool.clone();
		let construction_start = std::time::Instant::now();
		let built = tokio::task::spawn_blocking(move || route_builder::build_routes(&pool, &build_params))
			.await
			.map_err(|e| AppError::Private(PrivateError::UpstreamExhausted {
				attempts: 1,
				detail: format!("route builder worker panicked: {e}"),
			}))?;
		let route_construction_ms = construction_start.elapsed().as_millis();

		let mut warnings = Vec::new();
		let mut routes = Vec::with_capacity(built.len());
		for (i, mut route) in built.into_iter().enumerate() {
			arrival::validate(&mut route, req.current_time, &hours_by_poi_id);
			warnings.extend(route.warnings.iter().cloned());
			routes.push(PlannedRoute { route_id: (i + 1).to_string(), route });
		}

		Ok(PlanOutcome {
			routes,
			warnings,
			pool: pool_for_cache,
			candidate_acquisition_ms,
			route_construction_ms,
		})
	}

	/// `search_routes` (§6): the default planning entry point. `delete_cache`
	/// drops any prior entry first; `replace_route` plans a single
	/// additional route and stores it under the given id, leaving every
	/// other cached route untouched (§4.10). Otherwise the whole entry is
	/// overwritten with a fresh batch of up to `max_routes` routes (§3
	/// invariant (iv)).
	#[allow(clippy::too_many_arguments)]
	pub async fn search_routes(
		&self,
		user_id: Option<&str>,
		req: PlanRequest,
		delete_cache: bool,
		replace_route: Option<u32>,
	) -> Result<PlanOutcome, AppError> {
		if let Some(user_id) = user_id {
			if delete_cache {
				self.route_cache.delete(user_id).await?;
			}
		}

		if let Some(route_id) = replace_route {
			let Some(user_id) = user_id else {
				return Err(AppError::Public(PublicError::BadRequest(
					"replace_route requires a user_id".to_string(),
				)));
			};
			let mode = req.mode;
			let mut single = req;
			single.max_routes = 1;
			let mut outcome = self.plan(&single).await?;
			let Some(planned) = outcome.routes.pop() else {
				return Ok(outcome);
			};
			let route_id_str = route_id.to_string();
			self.store_single_route(user_id, &route_id_str, mode, &planned, &outcome.pool).await?;
			return Ok(PlanOutcome { routes: vec![planned], ..outcome });
		}

		let outcome = self.plan(&req).await?;
		if let Some(user_id) = user_id {
			self.store_fresh_entry(user_id, req.mode, &outcome.routes, &outcome.pool).await?;
		}
		Ok(outcome)
	}

	/// `replace_full_route` (§4.9): re-runs the full pipeline with a new
	/// query and overwrites only the named route id.
	pub async fn replace_full_route(
		&self,
		user_id: &str,
		route_id: &str,
		req: PlanRequest,
	) -> Result<Route, AppError> {
		let mode = req.mode;
		let mut single = req;
		single.max_routes = 1;
		let mut outcome = self.plan(&single).await?;
		let Some(planned) = outcome.routes.pop() else {
			return Err(AppError::Public(PublicError::Exhausted {
				filter: "route construction for replace_full_route".to_string(),
			}));
		};
		self.store_single_route(user_id, route_id, mode, &planned, &outcome.pool).await?;
		Ok(planned.route)
	}

	pub async fn replace_poi(
		&self,
		user_id: &str,
		route_id: &str,
		old_poi_id: &str,
		user_location: LatLon,
		top_k: usize,
		current_time: Option<NaiveDateTime>,
	) -> Result<Vec<ReplacementCandidate>, AppError> {
		if top_k == 0 {
			return Err(AppError::Public(PublicError::BadRequest("top_k must be > 0".to_string())));
		}
		self.substitution
			.replace_poi(user_id, route_id, old_poi_id, user_location, top_k, current_time)
			.await
	}

	pub async fn confirm_replace(
		&self,
		user_id: &str,
		route_id: &str,
		old_poi_id: &str,
		new_poi_id: &str,
	) -> Result<(), AppError> {
		self.substitution.confirm_replace(user_id, route_id, old_poi_id, new_poi_id).await
	}

	/// Read access to the per-user cache (C8) for handlers that need to
	/// report the committed state of a request back to the caller.
	pub fn route_cache(&self) -> &RouteCache {
		&self.route_cache
	}

	/// Replaces the entire per-user entry with a fresh batch of routes
	/// (the default `search_routes` path, §3 invariant (iv)). `available`
	/// is seeded from every POI the search surfaced minus the ones actually
	/// routed, so substitution (C9) has a same-search pool of alternatives
	/// to draw from (§3, §4.9 step 2).
	async fn store_fresh_entry(
		&self,
		user_id: &str,
		mode: TransportMode,
		routes: &[PlannedRoute],
		pool: &[Poi],
	) -> Result<(), AppError> {
		let mut entry = UserCacheEntry::new(mode);
		for planned in routes {
			let members: RouteMembers = planned
				.route
				.stops
				.iter()
				.map(|s| (s.poi_id.clone(), s.category.clone()))
				.collect();
			entry.routes.insert(planned.route_id.clone(), members);
		}
		entry.next_route_id = routes.len() as u32 + 1;
		entry.available = available_by_category(pool, &entry.all_routed_ids());

		self.route_cache.put(user_id, &entry).await
	}

	/// Stores a single route under `route_id`, discarding whatever was
	/// there before but leaving every other route in the entry untouched
	/// (§4.10 "replace_route N bounds memory"). Merges `pool`'s alternatives
	/// into `available` rather than replacing it, so a `replace_route` call
	/// grows the substitution pool instead of starving other routes of
	/// alternatives they already had.
	async fn store_single_route(
		&self,
		user_id: &str,
		route_id: &str,
		mode: TransportMode,
		planned: &PlannedRoute,
		pool: &[Poi],
	) -> Result<(), AppError> {
		let mut entry = self.route_cache.get(user_id).await?.unwrap_or_else(|| UserCacheEntry::new(mode));
		let members: RouteMembers = planned
			.route
			.stops
			.iter()
			.map(|s| (s.poi_id.clone(), s.category.clone()))
			.collect();
		entry.routes.insert(route_id.to_string(), members);

		let routed = entry.all_routed_ids();
		for (category, ids) in available_by_category(pool, &routed) {
			entry.available.entry(category).or_default().extend(ids);
		}
		for ids in entry.available.values_mut() {
			ids.retain(|id| !routed.contains(id));
		}

		self.route_cache.put(user_id, &entry).await
	}
}

/// Every pool POI not currently assigned to any route, grouped by category.
fn available_by_category(pool: &[Poi], routed: &HashSet<String>) -> HashMap<Category, HashSet<String>> {
	let mut map: HashMap<Category, HashSet<String>> = HashMap::new();
	for poi in pool {
		if !routed.contains(&poi.id) {
			map.entry(poi.category.clone()).or_default().insert(poi.id.clone());
		}
	}
	map
}
