/*
 * src/arrival.rs
 *
 * Arrival validator (C7).
 *
 * Purpose:
 *   Walks a built route against the starting wall-clock time, annotating
 *   each stop with its projected arrival and opening-hours summary, and
 *   flagging any stop that turns out to be closed at that instant (§4.7).
 */

use crate::hours::OpeningHours;
use crate::model::route::Route;
use chrono::NaiveDateTime;

/// Annotates `route` in place given the opening-hours record for each
/// stop, in stop order. `hours_by_poi_id` must contain every stop id.
///
/// When `current_time` is `None`, arrival times and hours summaries are
/// left unset and the route is trivially valid — the request carried no
/// wall-clock anchor to validate against.
pub fn validate(
	route: &mut Route,
	current_time: Option<NaiveDateTime>,
	hours_by_poi_id: &std::collections::HashMap<String, OpeningHours>,
) {
	let Some(start) = current_time else {
		route.is_valid_timing = true;
		return;
	};

	let mut cursor = start;
	let mut warnings = Vec::new();

	for stop in &mut route.stops {
		cursor += chrono::Duration::minutes(stop.travel_minutes_from_previous.round() as i64);
		stop.arrival_time = Some(cursor);

		if let Some(hours) = hours_by_poi_id.get(&stop.poi_id) {
			let summary = hours.summary_for_date(cursor.date());
			if !hours.is_open_at(cursor) {
				warnings.push(format!(
					"POI '{}' is closed at {} {}",
					stop.name,
					summary.day_name,
					cursor.format("%H:%M")
				));
			}
			stop.hours_summary = Some(summary);
		}

		cursor += chrono::Duration::minutes(stop.stay_minutes.round() as i64);
	}

	route.is_valid_timing = warnings.is_empty();
	route.warnings = warnings;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::hours::Interval;
	use crate::model::poi::Category;
	use crate::model::route::Stop;
	use chrono::NaiveDate;
	use std::collections::HashMap;

	fn dt(h: u32, m: u32) -> NaiveDateTime {
		NaiveDate::from_ymd_opt(2026, 2, 5).unwrap().and_hms_opt(h, m, 0).unwrap()
	}

	fn stop(id: &str, travel: f64) -> Stop {
		Stop {
			poi_id: id.to_string(),
			name: format!("POI {id}"),
			category: Category::Restaurant,
			lat: 0.0,
			lon: 0.0,
			order_index: 0,
			travel_minutes_from_previous: travel,
			stay_minutes: 30.0,
			arrival_time: None,
			hours_summary: None,
			meal_anchored: false,
		}
	}

	#[test]
	fn flags_closed_stop() {
		let mut route = Route::empty();
		route.stops = vec![stop("a", 0.0)];

		let mut days: [Vec<Interval>; 7] = Default::default();
		days[0] = vec![Interval {
			start: chrono::NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
			end: chrono::NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
		}];
		let mut hours_by_id = HashMap::new();
		hours_by_id.insert("a".to_string(), OpeningHours::from_week(days));

		validate(&mut route, Some(dt(7, 30)), &hours_by_id);

		assert!(!route.is_valid_timing);
		assert_eq!(route.warnings.len(), 1);
		assert!(route.warnings[0].contains("closed at Monday 07:30"));
	}

	#[test]
	fn open_stop_produces_no_warning() {
		let mut route = Route::empty();
		route.stops = vec![stop("a", 0.0)];
		let hours_by_id = HashMap::from([("a".to_string(), OpeningHours::always_open())]);

		validate(&mut route, Some(dt(12, 0)), &hours_by_id);

		assert!(route.is_valid_timing);
		assert!(route.warnings.is_empty());
	}

	#[test]
	fn no_current_time_skips_validation() {
		let mut route = Route::empty();
		route.stops = vec![stop("a", 0.0)];
		validate(&mut route, None, &HashMap::new());
		assert!(route.is_valid_timing);
		assert!(route.stops[0].arrival_time.is_none());
	}
}
