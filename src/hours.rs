/*
 * src/hours.rs
 *
 * File for the time-window evaluator (C1).
 *
 * Purpose:
 *   Parse and test per-day opening-hours structures for "open at instant t"
 *   and "overlaps window [a,b]". An opening-hours record that is absent or
 *   malformed is treated as "always open" — a deliberate policy choice
 *   rather than an error, so POIs with incomplete data are never silently
 *   dropped from a route.
 */

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A single `(start, end)` interval within one day. `end <= start` means the
/// interval crosses midnight into the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
	pub start: NaiveTime,
	pub end: NaiveTime,
}

impl Interval {
	pub fn crosses_midnight(&self) -> bool {
		self.end <= self.start
	}

	/// True if `t` falls within this interval, assuming `t` is on the same
	/// calendar day this interval's `start` belongs to.
	fn contains_same_day(&self, t: NaiveTime) -> bool {
		if self.crosses_midnight() {
			t >= self.start
		} else {
			t >= self.start && t < self.end
		}
	}

	/// True if `t` falls within the portion of this interval that spilled
	/// over from the previous day.
	fn contains_overflow(&self, t: NaiveTime) -> bool {
		self.crosses_midnight() && t < self.end
	}
}

const WEEKDAYS: [Weekday; 7] = [
	Weekday::Mon,
	Weekday::Tue,
	Weekday::Wed,
	Weekday::Thu,
	Weekday::Fri,
	Weekday::Sat,
	Weekday::Sun,
];

fn day_index(day: Weekday) -> usize {
	day.num_days_from_monday() as usize
}

/// Seven-day opening-hours record. `None` represents an absent or malformed
/// record, which the evaluator treats as "always open".
#[derive(Debug, Clone, Default)]
pub struct OpeningHours(Option<[Vec<Interval>; 7]>);

impl OpeningHours {
	pub fn always_open() -> Self {
		OpeningHours(None)
	}

	pub fn from_week(days: [Vec<Interval>; 7]) -> Self {
		OpeningHours(Some(days))
	}

	fn day(&self, weekday: Weekday) -> Option<&[Interval]> {
		self.0.as_ref().map(|days| days[day_index(weekday)].as_slice())
	}

	/// `is_open_at(hours, t)` (§4.1): resolves `t`'s day-of-week and the
	/// previous day (for overnight intervals); true iff any interval on
	/// either day contains `t`.
	pub fn is_open_at(&self, t: NaiveDateTime) -> bool {
		let Some(_) = &self.0 else { return true };

		let today = t.weekday();
		let yesterday = today.pred();
		let time = t.time();

		let today_open = self
			.day(today)
			.is_some_and(|intervals| intervals.iter().any(|iv| iv.contains_same_day(time)));
		let spillover_open = self
			.day(yesterday)
			.is_some_and(|intervals| intervals.iter().any(|iv| iv.contains_overflow(time)));

		today_open || spillover_open
	}

	/// `overlaps_window(hours, a, b)` (§4.1), `a <= b`: true iff some open
	/// interval on any day in `[a,b]` intersects `[a,b]`.
	pub fn overlaps_window(&self, a: NaiveDateTime, b: NaiveDateTime) -> bool {
		if self.0.is_none() {
			return true;
		}
		debug_assert!(a <= b, "overlaps_window requires a <= b");

		let mut cursor = a.date();
		loop {
			if cursor > b.date() {
				break;
			}
			if let Some(intervals) = self.day(cursor.weekday()) {
				for iv in intervals {
					let (start, end) = self.interval_bounds_for_day(cursor, iv);
					if start < b && end > a {
						return true;
					}
				}
			}
			cursor = cursor.succ_opt().expect("date overflow");
		}
		false
	}

	/// Resolves an interval anchored on `day` into absolute datetimes,
	/// extending past midnight when the interval crosses it.
	fn interval_bounds_for_day(&self, day: NaiveDate, iv: &Interval) -> (NaiveDateTime, NaiveDateTime) {
		let start = day.and_time(iv.start);
		let end = if iv.crosses_midnight() {
			day.succ_opt().expect("date overflow").and_time(iv.end)
		} else {
			day.and_time(iv.end)
		};
		(start, end)
	}

	/// `summary_for_date(hours, date)` (§4.1): used to annotate arrival
	/// times in responses.
	pub fn summary_for_date(&self, date: NaiveDate) -> DaySummary {
		let day_name = WEEKDAYS[day_index(date.weekday())];
		match self.day(date.weekday()) {
			None => DaySummary {
				day_name: day_name.to_string(),
				date,
				is_open: true,
				hours: Vec::new(),
				note: Some("hours unavailable, assumed open".to_string()),
			},
			Some(intervals) => DaySummary {
				day_name: day_name.to_string(),
				date,
				is_open: !intervals.is_empty(),
				hours: intervals.to_vec(),
				note: None,
			},
		}
	}
}

/// `summary_for_date` response shape (§4.1).
#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
	pub day_name: String,
	pub date: NaiveDate,
	pub is_open: bool,
	pub hours: Vec<Interval>,
	pub note: Option<String>,
}

// Opening hours are stored as JSONB in the POI store: an object keyed by day
// name, each value an array of `{start, end}` strings in `HH:MM`. A record
// that does not parse cleanly is treated as always-open rather than
// rejected, per the policy stated in §3.
impl Serialize for OpeningHours {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		use serde::ser::SerializeMap;
		let mut map = serializer.serialize_map(self.0.as_ref().map(|_| 7))?;
		if let Some(days) = &self.0 {
			for (i, weekday) in WEEKDAYS.iter().enumerate() {
				map.serialize_entry(&weekday.to_string(), &days[i])?;
			}
		}
		map.end()
	}
}

impl<'de> Deserialize<'de> for OpeningHours {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let value = Value::deserialize(deserializer)?;
		Ok(Self::parse_value(&value).unwrap_or_else(OpeningHours::always_open))
	}
}

impl OpeningHours {
	fn parse_value(value: &Value) -> Option<Self> {
		let obj = value.as_object()?;
		let mut days: [Vec<Interval>; 7] = Default::default();

		for (name, weekday) in [
			("Monday", Weekday::Mon),
			("Tuesday", Weekday::Tue),
			("Wednesday", Weekday::Wed),
			("Thursday", Weekday::Thu),
			("Friday", Weekday::Fri),
			("Saturday", Weekday::Sat),
			("Sunday", Weekday::Sun),
		] {
			let Some(entries) = obj.get(name) else {
				continue;
			};
			let entries = entries.as_array()?;
			let mut parsed = Vec::with_capacity(entries.len());
			for entry in entries {
				let start = entry.get("start")?.as_str()?;
				let end = entry.get("end")?.as_str()?;
				let start = NaiveTime::parse_from_str(start, "%H:%M").ok()?;
				let end = NaiveTime::parse_from_str(end, "%H:%M").ok()?;
				parsed.push(Interval { start, end });
			}
			days[day_index(weekday)] = parsed;
		}

		Some(OpeningHours(Some(days)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::NaiveDate;

	fn t(h: u32, m: u32) -> NaiveTime {
		NaiveTime::from_hms_opt(h, m, 0).unwrap()
	}

	fn dt(y: i32, mo: u32, d: u32, h: u32, m: u32) -> NaiveDateTime {
		NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, m, 0).unwrap()
	}

	fn mon_nine_to_five() -> OpeningHours {
		let mut days: [Vec<Interval>; 7] = Default::default();
		days[0] = vec![Interval { start: t(9, 0), end: t(17, 0) }];
		OpeningHours::from_week(days)
	}

	#[test]
	fn absent_hours_are_always_open() {
		let hours = OpeningHours::always_open();
		assert!(hours.is_open_at(dt(2026, 2, 5, 3, 0)));
	}

	#[test]
	fn open_within_window() {
		// 2026-02-02 is a Monday.
		let hours = mon_nine_to_five();
		assert!(hours.is_open_at(dt(2026, 2, 2, 12, 0)));
		assert!(!hours.is_open_at(dt(2026, 2, 2, 8, 59)));
		assert!(!hours.is_open_at(dt(2026, 2, 3, 12, 0))); // Tuesday closed
	}

	#[test]
	fn overnight_interval_extends_into_next_day() {
		let mut days: [Vec<Interval>; 7] = Default::default();
		days[4] = vec![Interval { start: t(22, 0), end: t(2, 0) }]; // Friday night
		let hours = OpeningHours::from_week(days);

		// 2026-02-07 is a Saturday; 01:00 is the spillover from Friday night.
		assert!(hours.is_open_at(dt(2026, 2, 7, 1, 0)));
		assert!(hours.is_open_at(dt(2026, 2, 6, 23, 0)));
		assert!(!hours.is_open_at(dt(2026, 2, 7, 3, 0)));
	}

	#[test]
	fn overlaps_window_detects_intersection() {
		let hours = mon_nine_to_five();
		assert!(hours.overlaps_window(dt(2026, 2, 2, 8, 0), dt(2026, 2, 2, 9, 30)));
		assert!(!hours.overlaps_window(dt(2026, 2, 2, 17, 0), dt(2026, 2, 2, 18, 0)));
	}

	#[test]
	fn malformed_hours_fall_back_to_always_open() {
		let value = serde_json::json!({"Monday": [{"start": "not-a-time", "end": "09:00"}]});
		let parsed: OpeningHours = serde_json::from_value(value).unwrap();
		assert!(parsed.is_open_at(dt(2026, 2, 2, 3, 0)));
	}
}
