use axum::{
	Json, Router,
	extract::{Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use feed_recall::{
	ChannelResults, ItemCandidate, RecallDiagnostics, RecallRequest, RecallResponse, planner,
};
use feed_retrieval::SearchRequest;

const DEFAULT_SCENE: &str = "home";
const DEFAULT_TOP_K: usize = 20;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/debug/recall", get(debug_recall))
		.route("/v1/search", post(search))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

#[derive(Debug, Deserialize)]
pub struct RecallQuery {
	pub user_id: i64,
	#[serde(default = "default_scene")]
	pub scene: String,
	#[serde(default = "default_top_k")]
	pub top_k: usize,
	pub diversity_key: Option<String>,
	pub diversity_limit: Option<i64>,
	pub diversity_fill_overflow: Option<bool>,
	pub interleave_channels: Option<bool>,
	#[serde(default)]
	pub diagnostics: bool,
	/// Comma-separated `name:weight` channel weight overrides.
	pub weights: Option<String>,
}
impl RecallQuery {
	fn into_request(self) -> Result<RecallRequest, ApiError> {
		let mut request = RecallRequest::new(self.user_id, self.scene, self.top_k)
			.with_diagnostics(self.diagnostics);

		if let Some(key) = self.diversity_key {
			request = request.with_filter(planner::DIVERSITY_KEY_FILTER, key);
		}
		if let Some(limit) = self.diversity_limit {
			request = request.with_filter(planner::DIVERSITY_LIMIT_FILTER, limit);
		}
		if let Some(fill) = self.diversity_fill_overflow {
			request = request.with_filter(planner::DIVERSITY_FILL_OVERFLOW_FILTER, fill);
		}
		if let Some(interleave) = self.interleave_channels {
			request = request.with_filter(planner::INTERLEAVE_CHANNELS_FILTER, interleave);
		}
		if let Some(raw) = self.weights.as_deref() {
			let overrides = parse_weights(raw)?;

			request = request.with_channel_weight_overrides(
				overrides.iter().map(|(name, weight)| (name.as_str(), *weight)),
			)?;
		}

		Ok(request)
	}
}

#[derive(Debug, Serialize)]
pub struct RecallBody {
	pub fused: Vec<ItemCandidate>,
	pub channel_results: ChannelResults,
	pub latency_ms: u64,
	pub diagnostics: Option<RecallDiagnostics>,
}
impl From<RecallResponse> for RecallBody {
	fn from(response: RecallResponse) -> Self {
		Self {
			fused: response.fused,
			channel_results: response.channel_results,
			latency_ms: response.latency.as_millis() as u64,
			diagnostics: response.diagnostics,
		}
	}
}

async fn debug_recall(
	State(state): State<AppState>,
	Query(query): Query<RecallQuery>,
) -> Result<Json<RecallBody>, ApiError> {
	let request = query.into_request()?;
	let response = state.recall.recall(&request).await;

	Ok(Json(response.into()))
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
	pub user_id: i64,
	pub query: String,
	#[serde(default)]
	pub include_global: bool,
	/// Zero or less falls back to the configured fusion depth.
	#[serde(default)]
	pub top_k: i64,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
	pub item_ids: Vec<i64>,
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchBody>,
) -> Result<Json<SearchResponse>, ApiError> {
	let mut request = SearchRequest::new(payload.user_id, payload.query, payload.top_k);

	if payload.include_global {
		request = request.global();
	}

	let item_ids = state.search.search(&request).await?;

	Ok(Json(SearchResponse { item_ids }))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}

	fn invalid_request(message: impl Into<String>) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
	}
}

impl From<feed_recall::Error> for ApiError {
	fn from(err: feed_recall::Error) -> Self {
		match err {
			feed_recall::Error::InvalidRequest { message } => Self::invalid_request(message),
			other => {
				tracing::error!(error = %other, "Recall request failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", other.to_string())
			},
		}
	}
}

impl From<feed_retrieval::Error> for ApiError {
	fn from(err: feed_retrieval::Error) -> Self {
		tracing::warn!(error = %err, "Search request failed.");

		match err {
			feed_retrieval::Error::Collaborator { message } =>
				Self::new(StatusCode::SERVICE_UNAVAILABLE, "COLLABORATOR_UNAVAILABLE", message),
			other =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", other.to_string()),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

fn default_scene() -> String {
	DEFAULT_SCENE.to_string()
}

fn default_top_k() -> usize {
	DEFAULT_TOP_K
}

fn parse_weights(raw: &str) -> Result<Vec<(String, f64)>, ApiError> {
	raw.split(',')
		.map(str::trim)
		.filter(|pair| !pair.is_empty())
		.map(|pair| {
			let (name, weight) = pair.split_once(':').ok_or_else(|| {
				ApiError::invalid_request(format!("Weight override {pair:?} must be name:weight."))
			})?;
			let weight = weight.trim().parse::<f64>().map_err(|_| {
				ApiError::invalid_request(format!("Weight override {pair:?} has a bad number."))
			})?;

			Ok((name.trim().to_string(), weight))
		})
		.collect()
}
