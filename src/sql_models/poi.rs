/*
 * src/sql_models/poi.rs
 *
 * Purpose:
 *   Maps rows of the POI store table (§6: `id, name, lat, lon, address,
 *   poi_type, normalize_stars_reviews, open_hours`) onto the domain `Poi`
 *   model. Kept as a distinct row type (rather than deriving `FromRow`
 *   directly on `Poi`) so the JSON opening-hours column and the bare
 *   category string get their own conversion step.
 */

use crate::hours::OpeningHours;
use crate::model::poi::{Category, Poi};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct PoiRow {
	pub id: String,
	pub name: String,
	pub lat: f64,
	pub lon: f64,
	pub address: String,
	pub poi_type: String,
	pub normalize_stars_reviews: f64,
	pub open_hours: serde_json::Value,
}

impl From<PoiRow> for Poi {
	fn from(row: PoiRow) -> Self {
		let opening_hours = serde_json::from_value::<OpeningHours>(row.open_hours)
			.unwrap_or_else(|_| OpeningHours::always_open());

		Poi {
			id: row.id,
			name: row.name,
			lat: row.lat,
			lon: row.lon,
			address: row.address,
			category: Category::from(row.poi_type),
			rating_score: row.normalize_stars_reviews,
			opening_hours,
			similarity_score: None,
		}
	}
}

pub fn rows_into_pois(rows: Vec<PoiRow>) -> Vec<Poi> {
	rows.into_iter().map(Poi::from).collect()
}
