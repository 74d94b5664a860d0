/*
 * src/geo.rs
 *
 * Geography kernel (C2).
 *
 * Purpose:
 *   Great-circle distance, initial bearing, bearing-difference normalization,
 *   and the two turn-shape scoring functions the route builder picks between
 *   (zigzag vs circular). Pure functions, no external state.
 */

/// Mean earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
	pub lat: f64,
	pub lon: f64,
}

impl LatLon {
	pub fn new(lat: f64, lon: f64) -> Self {
		LatLon { lat, lon }
	}
}

/// `haversine(a, b)` (§4.2) in meters.
pub fn haversine(a: LatLon, b: LatLon) -> f64 {
	let lat1 = a.lat.to_radians();
	let lat2 = b.lat.to_radians();
	let delta_lat = (b.lat - a.lat).to_radians();
	let delta_lon = (b.lon - a.lon).to_radians();

	let h = (delta_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
	let c = 2.0 * h.sqrt().asin();

	EARTH_RADIUS_M * c
}

/// `bearing(a, b)` (§4.2): initial bearing from `a` to `b`, degrees in `[0, 360)`.
pub fn bearing(a: LatLon, b: LatLon) -> f64 {
	let lat1 = a.lat.to_radians();
	let lat2 = b.lat.to_radians();
	let delta_lon = (b.lon - a.lon).to_radians();

	let y = delta_lon.sin() * lat2.cos();
	let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
	let theta = y.atan2(x).to_degrees();

	(theta + 360.0) % 360.0
}

/// `bearing_diff(β1, β2)` (§4.2): normalized absolute difference, degrees in `[0, 180]`.
pub fn bearing_diff(b1: f64, b2: f64) -> f64 {
	let d = (b1 - b2).abs() % 360.0;
	if d > 180.0 {
		360.0 - d
	} else {
		d
	}
}

/// `zigzag_score(β_prev, β_now)` (§4.2): peak at 0°, straight-line continuation.
pub fn zigzag_score(prev: f64, now: f64) -> f64 {
	1.0 - bearing_diff(prev, now) / 180.0
}

/// `circular_score(β_prev, β_now)` (§4.2): peak at 90°, right-angle turn.
pub fn circular_score(prev: f64, now: f64) -> f64 {
	1.0 - (bearing_diff(prev, now) - 90.0).abs() / 90.0
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn haversine_same_point_is_zero() {
		let p = LatLon::new(10.80, 106.77);
		assert!(haversine(p, p) < 0.001);
	}

	#[test]
	fn haversine_is_symmetric() {
		let a = LatLon::new(10.80, 106.77);
		let b = LatLon::new(10.81, 106.78);
		assert!((haversine(a, b) - haversine(b, a)).abs() < 1e-9);
	}

	#[test]
	fn haversine_known_distance() {
		// Las Vegas to Los Angeles, ~370 km.
		let lv = LatLon::new(36.17, -115.14);
		let la = LatLon::new(34.05, -118.24);
		let meters = haversine(lv, la);
		assert!(meters > 350_000.0 && meters < 400_000.0, "got {meters}");
	}

	#[test]
	fn bearing_due_north_is_zero() {
		let a = LatLon::new(10.0, 106.0);
		let b = LatLon::new(11.0, 106.0);
		assert!(bearing(a, b) < 1.0);
	}

	#[test]
	fn bearing_due_east_is_ninety() {
		let a = LatLon::new(10.0, 106.0);
		let b = LatLon::new(10.0, 107.0);
		let deg = bearing(a, b);
		assert!((deg - 90.0).abs() < 1.0, "got {deg}");
	}

	#[test]
	fn bearing_diff_collapses_reflex_angle() {
		assert!((bearing_diff(350.0, 10.0) - 20.0).abs() < 1e-9);
		assert_eq!(bearing_diff(0.0, 180.0), 180.0);
	}

	#[test]
	fn bearing_diff_is_within_range() {
		for (b1, b2) in [(0.0, 359.0), (45.0, 315.0), (10.0, 10.0)] {
			let d = bearing_diff(b1, b2);
			assert!((0.0..=180.0).contains(&d));
		}
	}

	#[test]
	fn zigzag_peaks_at_zero_degrees() {
		assert!((zigzag_score(0.0, 0.0) - 1.0).abs() < 1e-9);
		assert!(zigzag_score(0.0, 180.0).abs() < 1e-9);
	}

	#[test]
	fn circular_peaks_at_ninety_degrees() {
		assert!((circular_score(0.0, 90.0) - 1.0).abs() < 1e-9);
		assert!((circular_score(0.0, 0.0) - 0.0).abs() < 1e-9);
	}
}
