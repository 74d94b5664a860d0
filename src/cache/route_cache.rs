/*
 * src/cache/route_cache.rs
 *
 * Route cache (C8): per-user store of planned routes plus the pools of
 * available and already-substituted alternative POI ids, keyed
 * `user:<user_id>` (§3, §6). Reads return the object or a miss; writes are
 * last-write-wins and always carry a fresh TTL.
 */

use crate::cache::kv::CacheClient;
use crate::error::AppError;
use crate::global::USER_CACHE_TTL_SECS;
use crate::model::mode::TransportMode;
use crate::model::poi::Category;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// `(poi_id, category)` pairs in route order, as stored per route_id (§3).
pub type RouteMembers = Vec<(String, Category)>;

/// One user's cache entry (§3). `routes` keys are stringified integers,
/// monotonically increasing; `next_route_id` tracks the next to assign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCacheEntry {
	pub mode: TransportMode,
	pub routes: HashMap<String, RouteMembers>,
	pub available: HashMap<Category, HashSet<String>>,
	pub already_substituted: HashMap<Category, HashSet<String>>,
	pub next_route_id: u32,
}

impl UserCacheEntry {
	pub fn new(mode: TransportMode) -> Self {
		UserCacheEntry {
			mode,
			routes: HashMap::new(),
			available: HashMap::new(),
			already_substituted: HashMap::new(),
			next_route_id: 1,
		}
	}

	/// Every POI id currently assigned to any route, across the whole entry.
	pub fn all_routed_ids(&self) -> HashSet<String> {
		self.routes
			.values()
			.flat_map(|members| members.iter().map(|(id, _)| id.clone()))
			.collect()
	}

	/// Removes `id` from every category's available set (invariant (i), §3).
	pub fn remove_from_available(&mut self, category: &Category, id: &str) {
		if let Some(set) = self.available.get_mut(category) {
			set.remove(id);
		}
	}
}

#[derive(Clone)]
pub struct RouteCache {
	client: Arc<dyn CacheClient>,
}

impl RouteCache {
	pub fn new(client: Arc<dyn CacheClient>) -> Self {
		RouteCache { client }
	}

	fn key(user_id: &str) -> String {
		format!("user:{user_id}")
	}

	pub async fn get(&self, user_id: &str) -> Result<Option<UserCacheEntry>, AppError> {
		let Some(raw) = self.client.get(&Self::key(user_id)).await? else {
			return Ok(None);
		};
		Ok(serde_json::from_str(&raw).ok())
	}

	/// Atomic overwrite with a fresh TTL (§3 invariant (iii), (iv)).
	pub async fn put(&self, user_id: &str, entry: &UserCacheEntry) -> Result<(), AppError> {
		let raw = serde_json::to_string(entry).expect("UserCacheEntry is always serializable");
		self.client.set_with_ttl(&Self::key(user_id), raw, USER_CACHE_TTL_SECS).await
	}

	pub async fn delete(&self, user_id: &str) -> Result<(), AppError> {
		self.client.delete(&Self::key(user_id)).await
	}
}
