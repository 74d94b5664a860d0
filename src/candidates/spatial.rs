/*
 * src/candidates/spatial.rs
 *
 * Spatial candidate source (C3).
 *
 * Purpose:
 *   Resolves a query point to an H3 cell, enumerates the mode's k-disk,
 *   serves each cell from the cell cache or falls back to the POI store on
 *   miss, unions the results, and filters by great-circle distance (and
 *   optionally opening-hours overlap). Progressively widens the ring when
 *   the floor isn't met, per §4.3.
 */

use crate::cache::cell_cache::{CellCache, PoiSummary};
use crate::error::AppError;
use crate::geo::{LatLon, haversine};
use crate::global::{self, H3_RESOLUTION, MAX_CANDIDATES_FLOOR, MAX_RING_EXPANSION};
use crate::model::mode::TransportMode;
use crate::model::poi::Poi;
use crate::poi_store::PoiStore;
use crate::sql_models::poi::rows_into_pois;
use chrono::NaiveDateTime;
use h3o::{CellIndex, LatLng, Resolution};
use std::collections::HashSet;

/// Output of `spatial_candidates` (§4.3): the candidate pool plus the
/// effective radius actually used (which may exceed the mode's configured
/// radius after progressive expansion).
pub struct SpatialResult {
	pub pois: Vec<Poi>,
	pub effective_radius_km: f64,
}

pub struct SpatialCandidateSource {
	poi_store: PoiStore,
	cell_cache: CellCache,
}

impl SpatialCandidateSource {
	pub fn new(poi_store: PoiStore, cell_cache: CellCache) -> Self {
		SpatialCandidateSource { poi_store, cell_cache }
	}

	fn resolution() -> Resolution {
		Resolution::try_from(H3_RESOLUTION).expect("H3_RESOLUTION is a valid resolution 0-15")
	}

	/// `spatial_candidates(lat, lon, mode, [window])` (§4.3).
	pub async fn spatial_candidates(
		&self,
		lat: f64,
		lon: f64,
		mode: TransportMode,
		window: Option<(NaiveDateTime, NaiveDateTime)>,
	) -> Result<SpatialResult, AppError> {
		let profile = global::mode_profile(mode);
		let origin = LatLng::new(lat, lon).expect("valid coordinates").to_cell(Self::resolution());
		let user = LatLon::new(lat, lon);

		let mut k = profile.k_ring;
		let mut radius_km = profile.radius_km;

		loop {
			let pois = self.collect_within(origin, k, user, radius_km, window).await?;
			let expansions_used = k.saturating_sub(profile.k_ring);
			if pois.len() >= MAX_CANDIDATES_FLOOR || expansions_used >= MAX_RING_EXPANSION {
				return Ok(SpatialResult { pois, effective_radius_km: radius_km });
			}
			k += 1;
			radius_km *= 1.5;
		}
	}

	async fn collect_within(
		&self,
		origin: CellIndex,
		k: u32,
		user: LatLon,
		radius_km: f64,
		window: Option<(NaiveDateTime, NaiveDateTime)>,
	) -> Result<Vec<Poi>, AppError> {
		let cells = origin.grid_disk::<Vec<_>>(k);

		let mut seen_ids = HashSet::new();
		let mut pois = Vec::new();

		for cell in cells {
			for summary in self.cell_pois(cell).await? {
				if !seen_ids.insert(summary.id.clone()) {
					continue;
				}
				let point = LatLon::new(summary.lat, summary.lon);
				let distance_km = haversine(user, point) / 1000.0;
				if distance_km > radius_km {
					continue;
				}
				if let Some((a, b)) = window {
					if !summary.opening_hours.overlaps_window(a, b) {
						continue;
					}
				}
				pois.push((distance_km, poi_from_summary(summary)));
			}
		}

		pois.sort_by(|(a, _), (b, _)| a.partial_cmp(b).expect("distances are never NaN"));
		Ok(pois.into_iter().map(|(_, poi)| poi).collect())
	}

	async fn cell_pois(&self, cell: CellIndex) -> Result<Vec<PoiSummary>, AppError> {
		let cell_id = u64::from(cell);
		if let Some(cached) = self.cell_cache.get(cell_id).await? {
			return Ok(cached);
		}

		let boundary = cell.boundary();
		let mut min_lat = f64::MAX;
		let mut max_lat = f64::MIN;
		let mut min_lon = f64::MAX;
		let mut max_lon = f64::MIN;
		for vertex in boundary.iter() {
			min_lat = min_lat.min(vertex.lat());
			max_lat = max_lat.max(vertex.lat());
			min_lon = min_lon.min(vertex.lng());
			max_lon = max_lon.max(vertex.lng());
		}

		let rows = self.poi_store.fetch_in_bbox(min_lat, min_lon, max_lat, max_lon).await?;
		let pois = rows_into_pois(rows);
		let summaries: Vec<PoiSummary> = pois
			.iter()
			.map(|p| PoiSummary {
				id: p.id.clone(),
				lat: p.lat,
				lon: p.lon,
				category: p.category.clone(),
				rating_score: p.rating_score,
				opening_hours: p.opening_hours.clone(),
			})
			.collect();

		self.cell_cache.put(cell_id, &summaries).await?;
		Ok(summaries)
	}
}

/// Builds a provisional `Poi` from a cell-cache summary. Name and address
/// are left blank here; the orchestrator re-hydrates the final candidate
/// set from the POI store by id after intersecting spatial and semantic
/// pools (§2), which fills every field.
fn poi_from_summary(summary: PoiSummary) -> Poi {
	Poi {
		id: summary.id,
		name: String::new(),
		lat: summary.lat,
		lon: summary.lon,
		address: String::new(),
		category: summary.category,
		rating_score: summary.rating_score,
		opening_hours: summary.opening_hours,
		similarity_score: None,
	}
}
