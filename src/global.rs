/*
 * src/global.rs
 *
 * Process-wide constants.
 *
 * Purpose:
 *   Numeric defaults enumerated in the route-planning contract: H3
 *   resolution, per-mode speed/k-ring table, circular-routing tolerances,
 *   meal windows, cache lifetimes, and scoring weights. These are the knobs
 *   `config.rs` may override from the environment; the values here are the
 *   documented defaults.
 */

use crate::model::mode::TransportMode;

pub const LOG_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/logs");
pub const CRASH_LOG: &str = "crash.log";
pub const LATEST_LOG: &str = "latest.log";

/// Fixed H3 resolution used for the spatial cell cache (§6 default).
pub const H3_RESOLUTION: u8 = 9;

/// Floor below which `spatial_candidates` may progressively widen its k-ring.
pub const MAX_CANDIDATES_FLOOR: usize = 50;
/// Absolute cap on k-ring widening steps beyond the mode's configured k.
pub const MAX_RING_EXPANSION: u32 = 3;

/// Default stay time at a stop, in minutes, absent a per-category override.
pub const DEFAULT_STAY_MINUTES: f64 = 30.0;

/// Lunch window used for meal-anchor injection (local wall-clock `HH:MM`).
pub const LUNCH_WINDOW: (&str, &str) = ("11:30", "13:30");
/// Dinner window used for meal-anchor injection (local wall-clock `HH:MM`).
pub const DINNER_WINDOW: (&str, &str) = ("18:00", "20:00");

/// Per-user route cache entry lifetime, renewed on every write.
pub const USER_CACHE_TTL_SECS: u64 = 3600;
/// H3 cell cache entry lifetime.
pub const CELL_CACHE_TTL_SECS: u64 = 21_600;

/// Direction lock preference for circular routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircularDirectionPreference {
	Right,
	Left,
	Auto,
}

pub const USE_CIRCULAR_ROUTING: bool = true;
pub const CIRCULAR_ANGLE_TOLERANCE_DEG: f64 = 10.0;
pub const CIRCULAR_DIRECTION_PREFERENCE: CircularDirectionPreference =
	CircularDirectionPreference::Auto;

/// Closing-stop "near the user" threshold sequence, as a fraction of the
/// mode's radius, tried smallest-first (§4.6.5).
pub const CLOSING_STOP_RHO_SEQUENCE: [f64; 5] = [0.2, 0.4, 0.6, 0.8, 1.0];

#[derive(Debug, Clone, Copy)]
pub struct ModeProfile {
	pub speed_kmh: f64,
	pub k_ring: u32,
	pub radius_km: f64,
}

/// Returns the fixed (speed_kmh, k_ring, radius_km) table entry for a mode.
///
/// Speeds and k-rings are the per-mode defaults from §2/§6. The radius is
/// derived so that a k-ring of this size at [`H3_RESOLUTION`] comfortably
/// covers it; it is also the `R_max` used throughout the scoring functions
/// in §4.6.2.
pub fn mode_profile(mode: TransportMode) -> ModeProfile {
	match mode {
		TransportMode::Walking => ModeProfile {
			speed_kmh: 4.5,
			k_ring: 2,
			radius_km: 2.0,
		},
		TransportMode::Bicycling => ModeProfile {
			speed_kmh: 15.0,
			k_ring: 4,
			radius_km: 6.0,
		},
		TransportMode::Transit => ModeProfile {
			speed_kmh: 20.0,
			k_ring: 6,
			radius_km: 9.0,
		},
		TransportMode::Flexible => ModeProfile {
			speed_kmh: 25.0,
			k_ring: 7,
			radius_km: 11.0,
		},
		TransportMode::Driving => ModeProfile {
			speed_kmh: 40.0,
			k_ring: 9,
			radius_km: 15.0,
		},
	}
}
