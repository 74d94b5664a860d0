/*
 * src/cache/cell_cache.rs
 *
 * H3 cell cache entry (§3, §6): keyed `h3:<resolution>:<cell_id>`, value is
 * the list of POI summaries inside that cell. Written lazily on first miss
 * by the spatial candidate source (C3), read thereafter.
 */

use crate::cache::kv::CacheClient;
use crate::error::AppError;
use crate::global::{CELL_CACHE_TTL_SECS, H3_RESOLUTION};
use crate::model::poi::Category;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One POI summary as stored in a cell-cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiSummary {
	pub id: String,
	pub lat: f64,
	pub lon: f64,
	pub category: Category,
	pub rating_score: f64,
	pub opening_hours: crate::hours::OpeningHours,
}

pub struct CellCache {
	client: Arc<dyn CacheClient>,
}

impl CellCache {
	pub fn new(client: Arc<dyn CacheClient>) -> Self {
		CellCache { client }
	}

	fn key(cell_id: u64) -> String {
		format!("h3:{H3_RESOLUTION}:{cell_id}")
	}

	pub async fn get(&self, cell_id: u64) -> Result<Option<Vec<PoiSummary>>, AppError> {
		let Some(raw) = self.client.get(&Self::key(cell_id)).await? else {
			return Ok(None);
		};
		Ok(serde_json::from_str(&raw).ok())
	}

	pub async fn put(&self, cell_id: u64, pois: &[PoiSummary]) -> Result<(), AppError> {
		let raw = serde_json::to_string(pois).expect("PoiSummary list is always serializable");
		self.client.set_with_ttl(&Self::key(cell_id), raw, CELL_CACHE_TTL_SECS).await
	}
}
