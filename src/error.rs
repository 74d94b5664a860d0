/*
 * src/error.rs
 *
 * Error taxonomy for the route-planning engine.
 *
 * Purpose:
 *   A three-tier error type mirroring the taxonomy in the route-planning
 *   contract: input errors and cache-miss/exhaustion errors are client
 *   visible (`PublicError`); upstream collaborator failures are logged in
 *   full and answered with a generic message (`PrivateError`). `AppError`
 *   wraps both and implements `IntoResponse` so axum handlers can return it
 *   directly.
 */

use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

pub type ApiResult<T> = std::result::Result<T, AppError>;

/// Errors safe to describe to the caller verbatim.
#[derive(Debug, thiserror::Error)]
pub enum PublicError {
	#[error("bad request: {0}")]
	BadRequest(String),
	#[error("not found: {0}")]
	NotFound(String),
	#[error("conflict: {0}")]
	Conflict(String),
	/// Cache-miss error on substitution: user entry, route id, or POI id absent.
	#[error("cache miss: {0}")]
	CacheMiss(String),
	/// No candidates survived some filter; identifies which one.
	#[error("no candidates remain after {filter}")]
	Exhausted { filter: String },
}

/// Errors that should not be echoed back to the caller.
#[derive(Debug, thiserror::Error)]
pub enum PrivateError {
	#[error("database error: {0}")]
	Db(#[from] sqlx::Error),
	#[error("cache backend error: {0}")]
	Cache(String),
	#[error("vector index error: {0}")]
	VectorIndex(String),
	#[error("embedding service error: {0}")]
	Embedding(String),
	#[error("upstream exhausted after {attempts} attempt(s): {detail}")]
	UpstreamExhausted { attempts: u32, detail: String },
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error(transparent)]
	Public(#[from] PublicError),
	#[error(transparent)]
	Private(#[from] PrivateError),
}

impl From<sqlx::Error> for AppError {
	fn from(e: sqlx::Error) -> Self {
		AppError::Private(PrivateError::Db(e))
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		match self {
			AppError::Public(public) => {
				let status = match &public {
					PublicError::BadRequest(_) => StatusCode::BAD_REQUEST,
					PublicError::NotFound(_) => StatusCode::NOT_FOUND,
					PublicError::Conflict(_) => StatusCode::CONFLICT,
					PublicError::CacheMiss(_) => StatusCode::NOT_FOUND,
					PublicError::Exhausted { .. } => StatusCode::UNPROCESSABLE_ENTITY,
				};
				(status, Json(json!({ "error": public.to_string() }))).into_response()
			}
			AppError::Private(private) => {
				error!(target: "error", "{private}");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					Json(json!({ "error": "internal error" })),
				)
					.into_response()
			}
		}
	}
}
