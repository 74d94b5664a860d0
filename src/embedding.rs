/*
 * src/embedding.rs
 *
 * Embedding service client (§6).
 *
 * Purpose:
 *   Encodes free text into unit-norm vectors via the external embedding
 *   service, applying the asymmetric "query:"/"passage:" prefix convention
 *   before handing text to the model. Retries transient failures with
 *   exponential backoff up to 3 attempts (§7); a 30s timeout binds every
 *   single attempt.
 */

use crate::error::{AppError, PrivateError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const EMBEDDING_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
	/// Embeds a search query, applying the "query:" prefix.
	async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AppError>;
	/// Embeds a POI-side passage, applying the "passage:" prefix.
	async fn embed_passage(&self, text: &str) -> Result<Vec<f32>, AppError>;
}

pub struct HttpEmbeddingClient {
	http: reqwest::Client,
	endpoint: String,
}

impl HttpEmbeddingClient {
	pub fn new(endpoint: String) -> Self {
		let http = reqwest::Client::builder()
			.timeout(EMBEDDING_TIMEOUT)
			.build()
			.expect("failed to build embedding HTTP client");
		HttpEmbeddingClient { http, endpoint }
	}

	async fn embed_prefixed(&self, prefix: &str, text: &str) -> Result<Vec<f32>, AppError> {
		let body = EmbedRequest {
			texts: vec![format!("{prefix}{text}")],
		};

		let mut last_err = None;
		for attempt in 1..=MAX_ATTEMPTS {
			match self.try_embed(&body).await {
				Ok(vectors) => {
					return vectors.into_iter().next().ok_or_else(|| {
						AppError::Private(PrivateError::Embedding(
							"embedding service returned no vectors".to_string(),
						))
					});
				}
				Err(e) if attempt < MAX_ATTEMPTS => {
					last_err = Some(e);
					tokio::time::sleep(Duration::from_millis(100 * 2u64.pow(attempt - 1))).await;
				}
				Err(e) => last_err = Some(e),
			}
		}

		Err(AppError::Private(PrivateError::UpstreamExhausted {
			attempts: MAX_ATTEMPTS,
			detail: last_err.map(|e| e.to_string()).unwrap_or_default(),
		}))
	}

	async fn try_embed(&self, body: &EmbedRequest) -> Result<Vec<Vec<f32>>, PrivateError> {
		let response = self
			.http
			.post(&self.endpoint)
			.json(body)
			.send()
			.await
			.map_err(|e| PrivateError::Embedding(e.to_string()))?;

		if !response.status().is_success() {
			return Err(PrivateError::Embedding(format!(
				"embedding service returned status {}",
				response.status()
			)));
		}

		response
			.json::<EmbedResponse>()
			.await
			.map(|r| r.embeddings)
			.map_err(|e| PrivateError::Embedding(e.to_string()))
	}
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
	async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AppError> {
		self.embed_prefixed("query: ", text).await
	}

	async fn embed_passage(&self, text: &str) -> Result<Vec<f32>, AppError> {
		self.embed_prefixed("passage: ", text).await
	}
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
	texts: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
	embeddings: Vec<Vec<f32>>,
}
