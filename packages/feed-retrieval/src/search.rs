use std::sync::Arc;

use time::OffsetDateTime;

use crate::{BoxFuture, HybridPipeline, Result, RetrievalContext};

pub trait SubscriptionStore
where
	Self: Send + Sync,
{
	fn active_feed_ids<'a>(&'a self, user_id: i64) -> BoxFuture<'a, Result<Vec<i64>>>;
}

pub trait QueryEmbedder
where
	Self: Send + Sync,
{
	fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Option<Vec<f32>>>>;
}

#[derive(Clone, Debug)]
pub struct SearchRequest {
	pub user_id: i64,
	pub query: String,
	pub include_global: bool,
	/// Zero or less falls back to the configured fusion size.
	pub top_k: i64,
	pub embedding: Option<Vec<f32>>,
}
impl SearchRequest {
	pub fn new(user_id: i64, query: impl Into<String>, top_k: i64) -> Self {
		Self { user_id, query: query.into(), include_global: false, top_k, embedding: None }
	}

	pub fn global(mut self) -> Self {
		self.include_global = true;

		self
	}

	pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
		self.embedding = Some(embedding);

		self
	}
}

pub struct SearchService {
	pipeline: HybridPipeline,
	subscriptions: Arc<dyn SubscriptionStore>,
	embedder: Option<Arc<dyn QueryEmbedder>>,
	fusion_top_k: usize,
}
impl SearchService {
	pub fn new(
		pipeline: HybridPipeline,
		subscriptions: Arc<dyn SubscriptionStore>,
		fusion_top_k: usize,
	) -> Self {
		Self { pipeline, subscriptions, embedder: None, fusion_top_k }
	}

	pub fn with_embedder(mut self, embedder: Arc<dyn QueryEmbedder>) -> Self {
		self.embedder = Some(embedder);

		self
	}

	pub async fn search(&self, request: &SearchRequest) -> Result<Vec<i64>> {
		self.search_at(request, OffsetDateTime::now_utc()).await
	}

	/// Ranked document ids for `request`, with freshness measured against `now`.
	pub async fn search_at(
		&self,
		request: &SearchRequest,
		now: OffsetDateTime,
	) -> Result<Vec<i64>> {
		let query = request.query.trim();

		if query.is_empty() {
			return Ok(Vec::new());
		}

		let requested =
			if request.top_k <= 0 { self.fusion_top_k } else { request.top_k as usize };
		let fused_k = self.fusion_top_k.max(requested);
		let scope = if request.include_global {
			RetrievalContext::global(fused_k)
		} else {
			let feed_ids = self.subscriptions.active_feed_ids(request.user_id).await?;

			if feed_ids.is_empty() {
				tracing::debug!(user_id = request.user_id, "No subscriptions; search skipped.");

				return Ok(Vec::new());
			}

			RetrievalContext::scoped(request.user_id, feed_ids, fused_k)
		};
		let mut context = scope.with_query(query).with_request_time(now);

		context.embedding = match &request.embedding {
			Some(embedding) => Some(embedding.clone()),
			None => self.embed(query).await,
		};

		let mut ids: Vec<i64> =
			self.pipeline.execute(&context).await.into_iter().map(|doc| doc.doc_id).collect();

		ids.truncate(requested);

		Ok(ids)
	}

	async fn embed(&self, query: &str) -> Option<Vec<f32>> {
		let embedder = self.embedder.as_ref()?;

		match embedder.embed(query).await {
			Ok(embedding) => embedding,
			Err(err) => {
				tracing::warn!(error = %err, "Query embedding failed; lexical channel only.");

				None
			},
		}
	}
}
