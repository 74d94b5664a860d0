/*
 * src/cache/mod.rs
 *
 * Cache module group: the generic key-value client, the H3 cell cache
 * (C3's cache-or-store-query step), and the per-user route cache (C8).
 */

pub mod cell_cache;
pub mod kv;
pub mod route_cache;
