/*
 * src/candidates/mod.rs
 *
 * The "candidate source" abstraction (§9 design note): a sum of
 * `{spatial, semantic}` producers sharing one `produce` entry point, rather
 * than a trait object / dynamic dispatch hierarchy. The orchestrator (C10)
 * consumes both uniformly through this enum.
 */

pub mod semantic;
pub mod spatial;

use crate::error::{AppError, PublicError};
use crate::model::mode::TransportMode;
use crate::model::poi::Poi;
use chrono::NaiveDateTime;

/// The parameters a request to a candidate source carries. Each variant
/// only makes sense against the matching `CandidateSource` variant.
pub enum CandidateRequest {
	Spatial {
		lat: f64,
		lon: f64,
		mode: TransportMode,
		window: Option<(NaiveDateTime, NaiveDateTime)>,
	},
	Semantic {
		text: String,
		top_k: usize,
		id_filter: Option<Vec<String>>,
		category: Option<String>,
	},
}

pub enum CandidateSource {
	Spatial(spatial::SpatialCandidateSource),
	Semantic(semantic::SemanticCandidateSource),
}

impl CandidateSource {
	/// Shared entry point (§9): `produce(context) -> list<POI>`.
	pub async fn produce(&self, request: CandidateRequest) -> Result<Vec<Poi>, AppError> {
		match (self, request) {
			(CandidateSource::Spatial(source), CandidateRequest::Spatial { lat, lon, mode, window }) => {
				let result = source.spatial_candidates(lat, lon, mode, window).await?;
				Ok(result.pois)
			}
			(
				CandidateSource::Semantic(source),
				CandidateRequest::Semantic { text, top_k, id_filter, category },
			) => source.semantic_candidates(&text, top_k, id_filter.as_deref(), category.as_deref()).await,
			_ => Err(AppError::Public(PublicError::BadRequest(
				"candidate request does not match candidate source".to_string(),
			))),
		}
	}
}
