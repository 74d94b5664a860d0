/*
 * src/poi_store.rs
 *
 * POI store (§6): the relational source of truth behind both candidate
 * sources. Bounding-box queries back the spatial cell cache (C3); batch
 * reads by id list back hydration everywhere else.
 *
 * Purpose:
 *   A thin wrapper around the shared Postgres pool. Runtime-checked queries
 *   (not the `query!`/`query_as!` compile-time macros) since this table's
 *   schema is owned by the ingestion pipeline, out of scope here, and no
 *   migrations ship with this crate to validate against.
 */

use crate::error::{AppError, PrivateError};
use crate::sql_models::poi::PoiRow;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PoiStore {
	pool: PgPool,
}

const SELECT_COLUMNS: &str =
	"id, name, lat, lon, address, poi_type, normalize_stars_reviews, open_hours";

impl PoiStore {
	pub fn new(pool: PgPool) -> Self {
		PoiStore { pool }
	}

	/// Batch hydration by id list (§6), used after candidate-pool
	/// intersection and before substitution scoring.
	pub async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<PoiRow>, AppError> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}
		let query = format!("SELECT {SELECT_COLUMNS} FROM pois WHERE id = ANY($1)");
		sqlx::query_as::<_, PoiRow>(&query)
			.bind(ids)
			.fetch_all(&self.pool)
			.await
			.map_err(|e| AppError::Private(PrivateError::Db(e)))
	}

	/// Bounding-box query (§6) backing a single H3 cell lookup on cache miss
	/// (C3). `(min_lat, min_lon, max_lat, max_lon)`.
	pub async fn fetch_in_bbox(
		&self,
		min_lat: f64,
		min_lon: f64,
		max_lat: f64,
		max_lon: f64,
	) -> Result<Vec<PoiRow>, AppError> {
		let query = format!(
			"SELECT {SELECT_COLUMNS} FROM pois \
			 WHERE lat BETWEEN $1 AND $2 AND lon BETWEEN $3 AND $4"
		);
		sqlx::query_as::<_, PoiRow>(&query)
			.bind(min_lat)
			.bind(max_lat)
			.bind(min_lon)
			.bind(max_lon)
			.fetch_all(&self.pool)
			.await
			.map_err(|e| AppError::Private(PrivateError::Db(e)))
	}

	/// Single-POI hydration for the `GET /api/pois/:id` read-through
	/// endpoint (SPEC_FULL §B).
	pub async fn fetch_one(&self, id: &str) -> Result<Option<PoiRow>, AppError> {
		let rows = self.fetch_by_ids(std::slice::from_ref(&id.to_string())).await?;
		Ok(rows.into_iter().next())
	}

	/// Read-through for `visited_pois` (§6): the engine does not compute
	/// visited status itself (that's an external collaborator, §1), so this
	/// is a plain read of ids a collaborator already recorded.
	pub async fn fetch_visited_poi_ids(&self, user_id: &str) -> Result<Vec<String>, AppError> {
		sqlx::query_scalar::<_, String>("SELECT poi_id FROM visited_pois WHERE user_id = $1")
			.bind(user_id)
			.fetch_all(&self.pool)
			.await
			.map_err(|e| AppError::Private(PrivateError::Db(e)))
	}
}
