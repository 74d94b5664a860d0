/*
 * src/model/mode.rs
 *
 * Transportation mode enumeration.
 *
 * Purpose:
 *   A closed enumeration with a lookup table (`global::mode_profile`),
 *   not a class hierarchy, per the "dynamic dispatch -> tagged variants"
 *   design note.
 */

use serde::{Deserialize, Serialize};
use sqlx::Type;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransportMode {
	Walking,
	Bicycling,
	Transit,
	Flexible,
	Driving,
}

impl fmt::Display for TransportMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			TransportMode::Walking => "WALKING",
			TransportMode::Bicycling => "BICYCLING",
			TransportMode::Transit => "TRANSIT",
			TransportMode::Flexible => "FLEXIBLE",
			TransportMode::Driving => "DRIVING",
		};
		f.write_str(s)
	}
}

impl std::str::FromStr for TransportMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_uppercase().as_str() {
			"WALKING" => Ok(TransportMode::Walking),
			"BICYCLING" => Ok(TransportMode::Bicycling),
			"TRANSIT" => Ok(TransportMode::Transit),
			"FLEXIBLE" => Ok(TransportMode::Flexible),
			"DRIVING" => Ok(TransportMode::Driving),
			other => Err(format!("unknown transportation mode: {other}")),
		}
	}
}
