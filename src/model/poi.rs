/*
 * src/model/poi.rs
 *
 * File for POI and category models.
 *
 * Purpose:
 *   The point-of-interest record shared by every component, plus the fixed
 *   category vocabulary used for query expansion, category interleaving,
 *   and the per-category bookets in the per-user cache entry (§3).
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary category of a POI. A fixed vocabulary with an escape hatch for
/// categories the ingestion pipeline introduces that this engine does not
/// special-case (meal injection, food-alias expansion, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Category {
	Restaurant,
	CafeAndBakery,
	CultureAndHeritage,
	NatureAndView,
	Entertainment,
	Shopping,
	Bar,
	Other(String),
}

impl Category {
	pub const FOOD_ALIAS: &'static str = "Food & Local Flavours";

	pub fn as_str(&self) -> &str {
		match self {
			Category::Restaurant => "Restaurant",
			Category::CafeAndBakery => "Cafe & Bakery",
			Category::CultureAndHeritage => "Culture & heritage",
			Category::NatureAndView => "Nature & View",
			Category::Entertainment => "Entertainment",
			Category::Shopping => "Shopping",
			Category::Bar => "Bar",
			Category::Other(s) => s.as_str(),
		}
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<&str> for Category {
	fn from(s: &str) -> Self {
		match s.trim() {
			"Restaurant" => Category::Restaurant,
			"Cafe & Bakery" => Category::CafeAndBakery,
			"Culture & heritage" => Category::CultureAndHeritage,
			"Nature & View" => Category::NatureAndView,
			"Entertainment" => Category::Entertainment,
			"Shopping" => Category::Shopping,
			"Bar" => Category::Bar,
			other => Category::Other(other.to_string()),
		}
	}
}

impl From<String> for Category {
	fn from(s: String) -> Self {
		Category::from(s.as_str())
	}
}

impl From<Category> for String {
	fn from(c: Category) -> Self {
		c.as_str().to_string()
	}
}

/// A point of interest, hydrated from the POI store (§6) and optionally
/// carrying a semantic-similarity score attached by `semantic_candidates`
/// (C4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poi {
	pub id: String,
	pub name: String,
	pub lat: f64,
	pub lon: f64,
	pub address: String,
	pub category: Category,
	/// Normalized review-derived quality score in `[0, 1]`.
	pub rating_score: f64,
	pub opening_hours: crate::hours::OpeningHours,
	/// Cosine similarity against a query embedding, set only by a search
	/// pass that consulted the vector index (C4).
	pub similarity_score: Option<f64>,
}

impl Poi {
	/// Similarity score to use in scoring formulas when none was attached
	/// (e.g. a POI reached only through the spatial candidate source).
	pub fn similarity_or_default(&self) -> f64 {
		self.similarity_score.unwrap_or(0.0)
	}
}
