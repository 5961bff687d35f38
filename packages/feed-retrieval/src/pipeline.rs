//! Weighted fusion of independent retrieval handlers.

use std::{
	collections::{BTreeMap, HashSet},
	sync::Arc,
	time::Instant,
};

use crate::{
	BoxFuture, DocScore, LexicalHandler, LexicalIndex, Result, RetrievalContext, VectorHandler,
	VectorSearch,
};
use feed_config::Retrieval;
use feed_domain::{FreshnessDecay, blend_freshness, cmp_f64_desc};

pub trait RetrievalHandler
where
	Self: Send + Sync,
{
	fn name(&self) -> &'static str;

	fn supports(&self, context: &RetrievalContext) -> bool;

	fn handle<'a>(&'a self, context: &'a RetrievalContext) -> BoxFuture<'a, Result<Vec<DocScore>>>;
}

#[derive(Clone)]
struct WeightedHandler {
	handler: Arc<dyn RetrievalHandler>,
	weight: f64,
}

#[derive(Clone)]
pub struct HybridPipeline {
	handlers: Vec<WeightedHandler>,
	freshness_weight: f64,
	decay: FreshnessDecay,
}
impl HybridPipeline {
	pub fn new(freshness_weight: f64, half_life_hours: f64) -> Self {
		Self {
			handlers: Vec::new(),
			freshness_weight,
			decay: FreshnessDecay::from_half_life_hours(half_life_hours),
		}
	}

	/// Lexical and vector channels with the configured weights and limits.
	pub fn from_config(
		cfg: &Retrieval,
		lexical: Arc<dyn LexicalIndex>,
		vector: Arc<dyn VectorSearch>,
	) -> Self {
		Self::new(cfg.freshness_weight, cfg.half_life_hours)
			.with_handler(
				Arc::new(LexicalHandler::new(lexical, cfg.lexical_top_k as usize)),
				cfg.lexical_weight,
			)
			.with_handler(
				Arc::new(VectorHandler::new(
					vector,
					cfg.vector_top_k as usize,
					cfg.similarity_threshold,
				)),
				cfg.vector_weight,
			)
	}

	pub fn with_handler(mut self, handler: Arc<dyn RetrievalHandler>, weight: f64) -> Self {
		self.handlers.push(WeightedHandler { handler, weight });

		self
	}

	/// Never fails: a handler error is logged and that channel contributes nothing.
	pub async fn execute(&self, context: &RetrievalContext) -> Vec<DocScore> {
		let mut merged: BTreeMap<i64, DocScore> = BTreeMap::new();

		for WeightedHandler { handler, weight } in &self.handlers {
			if !handler.supports(context) {
				continue;
			}

			let started = Instant::now();
			let mut hits = match handler.handle(context).await {
				Ok(hits) => hits,
				Err(err) => {
					tracing::warn!(
						error = %err,
						handler = handler.name(),
						"Retrieval handler failed; skipping channel."
					);

					continue;
				},
			};

			tracing::debug!(
				handler = handler.name(),
				size = hits.len(),
				elapsed_ms = started.elapsed().as_millis() as u64,
				"Retrieval handler finished."
			);

			min_max_normalize(&mut hits);

			for hit in hits {
				merge(&mut merged, hit, *weight);
			}
		}

		let mut fused: Vec<DocScore> =
			merged.into_values().map(|doc| self.blend(doc, context)).collect();

		fused.sort_by(|left, right| {
			cmp_f64_desc(left.score, right.score).then_with(|| left.doc_id.cmp(&right.doc_id))
		});

		let mut titles = HashSet::new();

		fused.retain(|doc| doc.title_key().is_none_or(|title| titles.insert(title)));
		fused.truncate(context.top_k);

		fused
	}

	fn blend(&self, mut doc: DocScore, context: &RetrievalContext) -> DocScore {
		if self.freshness_weight <= 0.0 {
			return doc;
		}

		let freshness = doc
			.published_at
			.map(|published_at| self.decay.score(published_at, context.request_time))
			.unwrap_or(0.0);

		doc.score = blend_freshness(doc.score, freshness, self.freshness_weight);

		doc
	}
}

/// Rescales scores into `[0, 1]`; a channel whose scores are all equal maps every hit to 1.0.
pub fn min_max_normalize(hits: &mut [DocScore]) {
	let (min, max) = hits.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), hit| {
		(min.min(hit.score), max.max(hit.score))
	});
	let range = max - min;

	for hit in hits {
		hit.score = if range > 0.0 && range.is_finite() { (hit.score - min) / range } else { 1.0 };
	}
}

fn merge(merged: &mut BTreeMap<i64, DocScore>, hit: DocScore, weight: f64) {
	let contribution = hit.score * weight;

	match merged.get_mut(&hit.doc_id) {
		Some(existing) => {
			existing.score += contribution;

			if existing.published_at.is_none() {
				existing.published_at = hit.published_at;
			}
			if existing.title.is_none() {
				existing.title = hit.title;
			}
		},
		None => {
			merged.insert(hit.doc_id, DocScore { score: contribution, ..hit });
		},
	}
}
