/*
 * src/vector_index.rs
 *
 * Vector index client (§6).
 *
 * Purpose:
 *   Approximate-nearest-neighbor search over POI embeddings by cosine
 *   similarity. Point upsert/delete belong to the ingestion pipeline
 *   (out of scope, §1) — this engine only ever searches. Backed by
 *   `pgvector`'s `<=>` cosine-distance operator registered with sqlx.
 */

use crate::error::{AppError, PrivateError};
use async_trait::async_trait;
use pgvector::Vector;
use sqlx::PgPool;
use std::time::Duration;

const VECTOR_INDEX_TIMEOUT: Duration = Duration::from_secs(10);

/// A similarity hit: POI id plus cosine similarity in `[-1, 1]` (in
/// practice `[0, 1]` for unit-norm embeddings).
#[derive(Debug, Clone)]
pub struct VectorHit {
	pub poi_id: String,
	pub similarity: f32,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
	/// `search-top-k` with an optional id filter (§6). `category` further
	/// restricts results via the payload's tag-filter when present.
	async fn search_top_k(
		&self,
		vector: &[f32],
		top_k: usize,
		id_filter: Option<&[String]>,
		category: Option<&str>,
	) -> Result<Vec<VectorHit>, AppError>;
}

pub struct PgVectorIndex {
	pool: PgPool,
}

impl PgVectorIndex {
	pub fn new(pool: PgPool) -> Self {
		PgVectorIndex { pool }
	}
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
	async fn search_top_k(
		&self,
		vector: &[f32],
		top_k: usize,
		id_filter: Option<&[String]>,
		category: Option<&str>,
	) -> Result<Vec<VectorHit>, AppError> {
		let query_vector = Vector::from(vector.to_vec());

		let sql = match (id_filter.is_some(), category.is_some()) {
			(true, true) => {
				"SELECT id, 1.0 - (embedding <=> $1) AS similarity FROM poi_embeddings \
				 WHERE id = ANY($2) AND category = $3 \
				 ORDER BY embedding <=> $1 LIMIT $4"
			}
			(true, false) => {
				"SELECT id, 1.0 - (embedding <=> $1) AS similarity FROM poi_embeddings \
				 WHERE id = ANY($2) \
				 ORDER BY embedding <=> $1 LIMIT $4"
			}
			(false, true) => {
				"SELECT id, 1.0 - (embedding <=> $1) AS similarity FROM poi_embeddings \
				 WHERE category = $3 \
				 ORDER BY embedding <=> $1 LIMIT $4"
			}
			(false, false) => {
				"SELECT id, 1.0 - (embedding <=> $1) AS similarity FROM poi_embeddings \
				 ORDER BY embedding <=> $1 LIMIT $4"
			}
		};

		let rows = tokio::time::timeout(
			VECTOR_INDEX_TIMEOUT,
			sqlx::query_as::<_, (String, f32)>(sql)
				.bind(query_vector)
				.bind(id_filter.unwrap_or(&[]))
				.bind(category.unwrap_or(""))
				.bind(top_k as i64)
				.fetch_all(&self.pool),
		)
		.await
		.map_err(|_| AppError::Private(PrivateError::VectorIndex("search timed out".to_string())))?
		.map_err(|e| AppError::Private(PrivateError::VectorIndex(e.to_string())))?;

		Ok(rows
			.into_iter()
			.map(|(poi_id, similarity)| VectorHit { poi_id, similarity })
			.collect())
	}
}
