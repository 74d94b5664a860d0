/*
 * src/state.rs
 *
 * Shared application state handed to every handler through axum's `State`
 * extractor (§6). Bundles the orchestrator (C10) — which in turn owns
 * every other collaborator — plus the POI store, needed directly by the
 * read-through handlers that bypass the planning pipeline entirely.
 */

use crate::orchestrator::Orchestrator;
use crate::poi_store::PoiStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
	pub orchestrator: Arc<Orchestrator>,
	pub poi_store: PoiStore,
}
