#![allow(unexpected_cfgs)]

mod arrival;
mod cache;
mod candidates;
mod config;
mod controllers;
mod db;
mod embedding;
mod error;
mod geo;
mod global;
mod hours;
mod http_models;
mod log;
mod model;
mod orchestrator;
mod poi_store;
mod query_expander;
mod route_builder;
mod sql_models;
mod state;
mod substitution;
mod vector_index;

use crate::cache::cell_cache::CellCache;
use crate::cache::kv::{CacheClient, RedisCacheClient};
use crate::cache::route_cache::RouteCache;
use crate::candidates::semantic::SemanticCandidateSource;
use crate::candidates::spatial::SpatialCandidateSource;
use crate::config::Config;
use crate::controllers::{poi::poi_routes, routes::{health_routes, routes_routes}, substitution::substitution_routes};
use crate::embedding::{EmbeddingClient, HttpEmbeddingClient};
use crate::orchestrator::Orchestrator;
use crate::poi_store::PoiStore;
use crate::state::AppState;
use crate::vector_index::{PgVectorIndex, VectorIndex};
use axum::Router;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[cfg(not(tarpaulin_include))]
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
	dotenvy::dotenv().ok();
	log::init_panic_handler();
	log::init_logger();

	let config = Config::from_env();

	let pool = db::create_pool().await;
	let poi_store = PoiStore::new(pool.clone());

	let cache_backend: Arc<dyn CacheClient> = Arc::new(RedisCacheClient::connect(&config.redis_url).await?);
	let cell_cache = CellCache::new(Arc::clone(&cache_backend));
	let route_cache = RouteCache::new(Arc::clone(&cache_backend));

	let embedding_client: Arc<dyn EmbeddingClient> =
		Arc::new(HttpEmbeddingClient::new(config.embedding_service_url.clone()));
	let vector_index: Arc<dyn VectorIndex> = Arc::new(PgVectorIndex::new(pool.clone()));

	let spatial = SpatialCandidateSource::new(poi_store.clone(), cell_cache);
	let semantic = SemanticCandidateSource::new(embedding_client, vector_index, poi_store.clone());
	let orchestrator = Orchestrator::new(spatial, semantic, poi_store.clone(), route_cache);

	let state = AppState { orchestrator: Arc::new(orchestrator), poi_store };

	// No cookie-based auth and no served frontend dist in scope here: the
	// engine is a pure JSON API consumed by another service (Non-goal, §1).
	let cors = CorsLayer::permissive();

	let api_routes = Router::new()
		.nest("/routes", routes_routes().merge(substitution_routes()))
		.nest("/pois", poi_routes());
	let api_routes = Router::new().nest("/api", api_routes);

	let app = Router::new()
		.merge(api_routes)
		.merge(health_routes())
		.with_state(state)
		.layer(TraceLayer::new_for_http())
		.layer(cors);

	let addr = SocketAddr::from_str(&config.bind_address).expect("invalid BIND_ADDRESS format");
	println!("Server starting on {addr}");

	let listener = tokio::net::TcpListener::bind(addr).await?;
	axum::serve(listener, app.into_make_service()).await?;

	Ok(())
}
