use std::sync::Arc;

use time::OffsetDateTime;

use crate::{BoxFuture, DocScore, Result, RetrievalContext, pipeline::RetrievalHandler};
use feed_domain::{cmp_f64_desc, cosine_similarity};

pub trait VectorSearch
where
	Self: Send + Sync,
{
	/// Hits in scope whose similarity to `embedding` is at least `threshold`, best first.
	fn search<'a>(
		&'a self,
		embedding: &'a [f32],
		context: &'a RetrievalContext,
		k: usize,
		threshold: f64,
	) -> BoxFuture<'a, Result<Vec<DocScore>>>;
}

#[derive(Clone, Debug, Default)]
pub struct VectorDocument {
	pub doc_id: i64,
	pub feed_id: Option<i64>,
	pub title: Option<String>,
	pub published_at: Option<OffsetDateTime>,
	pub vector: Vec<f32>,
}

/// Exhaustive cosine scan.
#[derive(Debug, Default)]
pub struct MemoryVectorIndex {
	documents: Vec<VectorDocument>,
}
impl MemoryVectorIndex {
	pub fn new(documents: impl IntoIterator<Item = VectorDocument>) -> Self {
		Self { documents: documents.into_iter().filter(|doc| !doc.vector.is_empty()).collect() }
	}

	pub fn len(&self) -> usize {
		self.documents.len()
	}

	pub fn is_empty(&self) -> bool {
		self.documents.is_empty()
	}

	pub fn rank(
		&self,
		embedding: &[f32],
		context: &RetrievalContext,
		k: usize,
		threshold: f64,
	) -> Vec<DocScore> {
		let mut hits: Vec<DocScore> = self
			.documents
			.iter()
			.filter(|document| context.allows(document.feed_id))
			.filter_map(|document| {
				let similarity = cosine_similarity(embedding, &document.vector)?;

				(similarity >= threshold).then(|| {
					DocScore::new(document.doc_id, similarity)
						.with_published_at(document.published_at)
						.with_title(document.title.clone())
				})
			})
			.collect();

		hits.sort_by(|left, right| {
			cmp_f64_desc(left.score, right.score).then_with(|| left.doc_id.cmp(&right.doc_id))
		});
		hits.truncate(k);

		hits
	}
}

impl VectorSearch for MemoryVectorIndex {
	fn search<'a>(
		&'a self,
		embedding: &'a [f32],
		context: &'a RetrievalContext,
		k: usize,
		threshold: f64,
	) -> BoxFuture<'a, Result<Vec<DocScore>>> {
		Box::pin(async move { Ok(self.rank(embedding, context, k, threshold)) })
	}
}

pub struct VectorHandler {
	index: Arc<dyn VectorSearch>,
	top_k: usize,
	similarity_threshold: f64,
}
impl VectorHandler {
	pub fn new(index: Arc<dyn VectorSearch>, top_k: usize, similarity_threshold: f64) -> Self {
		Self { index, top_k, similarity_threshold }
	}
}

impl RetrievalHandler for VectorHandler {
	fn name(&self) -> &'static str {
		"vector"
	}

	fn supports(&self, context: &RetrievalContext) -> bool {
		context.vector().is_some()
	}

	fn handle<'a>(&'a self, context: &'a RetrievalContext) -> BoxFuture<'a, Result<Vec<DocScore>>> {
		Box::pin(async move {
			let Some(embedding) = context.vector() else { return Ok(Vec::new()) };

			self.index.search(embedding, context, self.top_k, self.similarity_threshold).await
		})
	}
}
