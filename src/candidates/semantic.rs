/*
 * src/candidates/semantic.rs
 *
 * Semantic candidate source (C4).
 *
 * Purpose:
 *   Encodes the query text via the embedding service, searches the vector
 *   index for the top-k nearest POIs by cosine similarity, and hydrates
 *   hits with full POI records (§4.4). The similarity score travels with
 *   the returned `Poi`.
 */

use crate::embedding::EmbeddingClient;
use crate::error::AppError;
use crate::poi_store::PoiStore;
use crate::sql_models::poi::rows_into_pois;
use crate::model::poi::Poi;
use crate::vector_index::VectorIndex;
use std::collections::HashMap;
use std::sync::Arc;

pub struct SemanticCandidateSource {
	embedding: Arc<dyn EmbeddingClient>,
	vector_index: Arc<dyn VectorIndex>,
	poi_store: PoiStore,
}

impl SemanticCandidateSource {
	pub fn new(
		embedding: Arc<dyn EmbeddingClient>,
		vector_index: Arc<dyn VectorIndex>,
		poi_store: PoiStore,
	) -> Self {
		SemanticCandidateSource { embedding, vector_index, poi_store }
	}

	/// `semantic_candidates(text, top_k, [id_filter])` (§4.4).
	pub async fn semantic_candidates(
		&self,
		text: &str,
		top_k: usize,
		id_filter: Option<&[String]>,
		category: Option<&str>,
	) -> Result<Vec<Poi>, AppError> {
		let vector = self.embedding.embed_query(text).await?;
		let hits = self.vector_index.search_top_k(&vector, top_k, id_filter, category).await?;
		if hits.is_empty() {
			return Ok(Vec::new());
		}

		let mut similarity_by_id: HashMap<String, f32> = HashMap::new();
		let ids: Vec<String> = hits
			.into_iter()
			.map(|hit| {
				similarity_by_id.insert(hit.poi_id.clone(), hit.similarity);
				hit.poi_id
			})
			.collect();

		let rows = self.poi_store.fetch_by_ids(&ids).await?;
		let mut pois = rows_into_pois(rows);
		for poi in &mut pois {
			if let Some(similarity) = similarity_by_id.get(&poi.id) {
				poi.similarity_score = Some(*similarity as f64);
			}
		}
		// Preserve similarity-descending order from the vector index; the
		// store's batch read does not guarantee row order.
		pois.sort_by(|a, b| {
			b.similarity_or_default()
				.partial_cmp(&a.similarity_or_default())
				.expect("similarity scores are never NaN")
		});
		Ok(pois)
	}
}
