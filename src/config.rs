/*
 * src/config.rs
 *
 * File for runtime configuration.
 *
 * Purpose:
 *   Reads the process environment once at startup. The numeric planning
 *   knobs (H3 resolution, scoring weights, TTLs, ...) have compiled-in
 *   defaults in `global.rs`; this module only owns the values that are
 *   meaningfully per-deployment (connection strings, bind address).
 */

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub redis_url: String,
	pub embedding_service_url: String,
	pub bind_address: String,
}

impl Config {
	/// Loads configuration from the environment, having already called
	/// `dotenvy::dotenv()` in `main`.
	pub fn from_env() -> Self {
		Self {
			database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
			redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
			embedding_service_url: env::var("EMBEDDING_SERVICE_URL")
				.unwrap_or_else(|_| "http://127.0.0.1:8081/embed".into()),
			bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3001".into()),
		}
	}
}
