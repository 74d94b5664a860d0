/*
 * src/cache/kv.rs
 *
 * Generic key-value cache client (§6): set-with-TTL, get, delete, atomic
 * overwrite. Both the cell cache and the per-user route cache are built on
 * top of this one client so they share the same timeout/retry policy.
 *
 * Purpose:
 *   A thin `redis`-backed implementation behind a trait, so route/cell
 *   caches can be unit-tested against an in-memory fake without a live
 *   Redis instance.
 */

use crate::error::{AppError, PrivateError};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

const CACHE_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait CacheClient: Send + Sync {
	async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
	/// Last-write-wins set with a fresh TTL (§3 invariant (iii), §6).
	async fn set_with_ttl(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), AppError>;
	async fn delete(&self, key: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct RedisCacheClient {
	conn: ConnectionManager,
}

impl RedisCacheClient {
	pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
		let client = redis::Client::open(redis_url)
			.map_err(|e| AppError::Private(PrivateError::Cache(e.to_string())))?;
		let conn = client
			.get_connection_manager()
			.await
			.map_err(|e| AppError::Private(PrivateError::Cache(e.to_string())))?;
		Ok(RedisCacheClient { conn })
	}

	async fn with_timeout<F, T>(fut: F) -> Result<T, AppError>
	where
		F: std::future::Future<Output = redis::RedisResult<T>>,
	{
		tokio::time::timeout(CACHE_TIMEOUT, fut)
			.await
			.map_err(|_| AppError::Private(PrivateError::Cache("cache operation timed out".to_string())))?
			.map_err(|e| AppError::Private(PrivateError::Cache(e.to_string())))
	}
}

#[async_trait]
impl CacheClient for RedisCacheClient {
	async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
		let mut conn = self.conn.clone();
		Self::with_timeout(conn.get(key)).await
	}

	async fn set_with_ttl(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), AppError> {
		let mut conn = self.conn.clone();
		Self::with_timeout(conn.set_ex(key, value, ttl_secs)).await
	}

	async fn delete(&self, key: &str) -> Result<(), AppError> {
		let mut conn = self.conn.clone();
		Self::with_timeout(conn.del(key)).await
	}
}

/// In-memory stand-in for tests; no TTL enforcement since tests run
/// fast enough not to need it.
#[derive(Default)]
pub struct InMemoryCacheClient {
	store: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl CacheClient for InMemoryCacheClient {
	async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
		Ok(self.store.lock().unwrap().get(key).cloned())
	}

	async fn set_with_ttl(&self, key: &str, value: String, _ttl_secs: u64) -> Result<(), AppError> {
		self.store.lock().unwrap().insert(key.to_string(), value);
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), AppError> {
		self.store.lock().unwrap().remove(key);
		Ok(())
	}
}
