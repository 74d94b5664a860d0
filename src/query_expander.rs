/*
 * src/query_expander.rs
 *
 * Query expander (C5).
 *
 * Purpose:
 *   Turns a user-typed interest phrase into the ordered, deduplicated list
 *   of canonical categories the route builder scores against, applying the
 *   food-alias expansion, the customer_like heritage nudge, and meal-time
 *   Restaurant injection (§4.5).
 */

use crate::global::{DINNER_WINDOW, LUNCH_WINDOW};
use crate::model::poi::Category;
use chrono::{NaiveDateTime, NaiveTime};

/// Result of expanding a raw query: the ordered category list, and whether
/// a `Restaurant` entry was meal-anchored (forced into a meal-overlapping
/// slot rather than scored normally, §4.6.4).
#[derive(Debug, Clone)]
pub struct ExpandedQuery {
	pub categories: Vec<Category>,
	pub meal_anchored: bool,
}

/// `query_expand` (§4.5). `budget_minutes` is the request's total time
/// budget; `current_time` is the optional wall-clock start.
pub fn expand(
	raw_query: &str,
	customer_like: bool,
	current_time: Option<NaiveDateTime>,
	budget_minutes: f64,
) -> ExpandedQuery {
	let mut categories: Vec<Category> = Vec::new();
	let mut push_unique = |cat: Category, list: &mut Vec<Category>| {
		if !list.contains(&cat) {
			list.push(cat);
		}
	};

	for token in raw_query.split(',') {
		let token = token.trim();
		if token.is_empty() {
			continue;
		}
		if token.eq_ignore_ascii_case(Category::FOOD_ALIAS) {
			push_unique(Category::CafeAndBakery, &mut categories);
			push_unique(Category::Restaurant, &mut categories);
		} else {
			push_unique(canonicalize(token), &mut categories);
		}
	}

	if customer_like && is_food_only(&categories) {
		push_unique(Category::CultureAndHeritage, &mut categories);
	}

	let mut meal_anchored = false;
	if let Some(start) = current_time {
		let end = start + chrono::Duration::minutes(budget_minutes.round() as i64);
		if !categories.contains(&Category::Restaurant) && overlaps_meal_window(start, end) {
			categories.push(Category::Restaurant);
			meal_anchored = true;
		}
	}

	ExpandedQuery { categories, meal_anchored }
}

/// Case-insensitive match against the fixed vocabulary (§3); anything else
/// becomes `Other` with its original (trimmed) casing preserved.
fn canonicalize(token: &str) -> Category {
	for known in [
		Category::Restaurant,
		Category::CafeAndBakery,
		Category::CultureAndHeritage,
		Category::NatureAndView,
		Category::Entertainment,
		Category::Shopping,
		Category::Bar,
	] {
		if token.eq_ignore_ascii_case(known.as_str()) {
			return known;
		}
	}
	Category::Other(token.to_string())
}

fn is_food_only(categories: &[Category]) -> bool {
	categories.len() == 2
		&& categories.contains(&Category::CafeAndBakery)
		&& categories.contains(&Category::Restaurant)
}

fn overlaps_meal_window(start: NaiveDateTime, end: NaiveDateTime) -> bool {
	[LUNCH_WINDOW, DINNER_WINDOW].into_iter().any(|(from, to)| {
		let window_start = NaiveTime::parse_from_str(from, "%H:%M").expect("meal window constants are valid");
		let window_end = NaiveTime::parse_from_str(to, "%H:%M").expect("meal window constants are valid");
		let day_start = start.date().and_time(window_start);
		let day_end = start.date().and_time(window_end);
		day_start < end && day_end > start
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::NaiveDate;

	fn dt(h: u32, m: u32) -> NaiveDateTime {
		NaiveDate::from_ymd_opt(2026, 2, 5).unwrap().and_hms_opt(h, m, 0).unwrap()
	}

	#[test]
	fn splits_and_canonicalizes() {
		let expanded = expand("restaurant, Bar", false, None, 0.0);
		assert_eq!(expanded.categories, vec![Category::Restaurant, Category::Bar]);
		assert!(!expanded.meal_anchored);
	}

	#[test]
	fn food_alias_expands_to_two_categories() {
		let expanded = expand("Food & Local Flavours", false, None, 0.0);
		assert_eq!(expanded.categories, vec![Category::CafeAndBakery, Category::Restaurant]);
	}

	#[test]
	fn customer_like_appends_heritage_for_food_only() {
		let expanded = expand("Food & Local Flavours", true, None, 0.0);
		assert_eq!(
			expanded.categories,
			vec![Category::CafeAndBakery, Category::Restaurant, Category::CultureAndHeritage]
		);
	}

	#[test]
	fn meal_window_injects_restaurant() {
		let expanded = expand("Culture & heritage", false, Some(dt(11, 0)), 180.0);
		assert!(expanded.categories.contains(&Category::Restaurant));
		assert!(expanded.meal_anchored);
	}

	#[test]
	fn no_injection_when_restaurant_already_present() {
		let expanded = expand("Restaurant", false, Some(dt(11, 0)), 180.0);
		assert!(!expanded.meal_anchored);
	}

	#[test]
	fn no_injection_outside_meal_windows() {
		let expanded = expand("Culture & heritage", false, Some(dt(15, 0)), 30.0);
		assert!(!expanded.categories.contains(&Category::Restaurant));
		assert!(!expanded.meal_anchored);
	}
}
