/*
 * src/db.rs
 *
 * Database pool construction.
 *
 * Purpose:
 *   Builds the process-wide Postgres connection pool (bounded, §5: typical
 *   10-50 connections) used by the POI store and the vector index. `pgvector`
 *   registers its `Vector` type with sqlx so POI embeddings can be stored
 *   and queried with the `<=>` cosine-distance operator.
 */

use sqlx::postgres::{PgPoolOptions, PgPool};
use std::env;
use std::time::Duration;

/// Creates the shared Postgres pool from `DATABASE_URL`.
///
/// Panics if `DATABASE_URL` is unset or the pool cannot be established —
/// there is nothing useful to do at startup without a database.
pub async fn create_pool() -> PgPool {
	let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

	PgPoolOptions::new()
		.max_connections(50)
		.min_connections(10)
		.acquire_timeout(Duration::from_secs(60))
		.connect(&database_url)
		.await
		.expect("Failed to connect to Postgres")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_db_pool_panics_without_env() {
		let prev = env::var("DATABASE_URL").ok();
		unsafe {
			env::remove_var("DATABASE_URL");
		}

		let result = std::panic::catch_unwind(|| {
			let rt = tokio::runtime::Runtime::new().unwrap();
			rt.block_on(async {
				let _ = create_pool().await;
			});
		});

		match prev {
			Some(val) => unsafe { env::set_var("DATABASE_URL", val) },
			None => unsafe { env::remove_var("DATABASE_URL") },
		}

		assert!(result.is_err());
	}
}
