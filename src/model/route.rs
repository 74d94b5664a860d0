/*
 * src/model/route.rs
 *
 * File for the Route and Stop models.
 *
 * Purpose:
 *   The output of the route builder (C6), annotated in place by the arrival
 *   validator (C7). Stops reference POIs by id, not by pointer (§9).
 */

use crate::hours::DaySummary;
use crate::model::poi::Category;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One stop in a built route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
	pub poi_id: String,
	pub name: String,
	pub category: Category,
	pub lat: f64,
	pub lon: f64,
	pub order_index: usize,
	/// Minutes of travel from the previous stop (0 for the first stop).
	pub travel_minutes_from_previous: f64,
	/// Minutes spent at this stop.
	pub stay_minutes: f64,
	/// Only set when the request carried a `current_time`.
	pub arrival_time: Option<NaiveDateTime>,
	pub hours_summary: Option<DaySummary>,
	/// True when this stop was force-inserted by the meal-anchor rule.
	pub meal_anchored: bool,
}

/// An ordered tour built by C6, later annotated by C7.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
	pub stops: Vec<Stop>,
	pub total_travel_minutes: f64,
	pub total_stay_minutes: f64,
	pub total_minutes: f64,
	pub total_score: f64,
	/// `score / (total_minutes / 100)`; 0 for an empty route.
	pub efficiency: f64,
	/// Set by C7; false iff any stop produced a closed-at-arrival warning.
	pub is_valid_timing: bool,
	pub warnings: Vec<String>,
}

impl Route {
	pub fn empty() -> Self {
		Route {
			stops: Vec::new(),
			total_travel_minutes: 0.0,
			total_stay_minutes: 0.0,
			total_minutes: 0.0,
			total_score: 0.0,
			efficiency: 0.0,
			is_valid_timing: true,
			warnings: Vec::new(),
		}
	}

	/// Recomputes the aggregate totals from `stops` and `total_score`.
	/// Called once construction of the stop list is finished.
	pub fn recompute_totals(&mut self) {
		self.total_travel_minutes = self.stops.iter().map(|s| s.travel_minutes_from_previous).sum();
		self.total_stay_minutes = self.stops.iter().map(|s| s.stay_minutes).sum();
		self.total_minutes = self.total_travel_minutes + self.total_stay_minutes;
		self.efficiency = if self.total_minutes > 0.0 {
			self.total_score / (self.total_minutes / 100.0)
		} else {
			0.0
		};
	}
}
