//! Attribute recall backed by hybrid retrieval: each preferred attribute value becomes a text
//! query over the whole catalog.

use std::collections::HashMap;

use crate::{BoxFuture, HybridPipeline, RetrievalContext};
use feed_domain::{AttributePreference, Metadata, ScoredId, cmp_f64_desc, sort_scores_desc};
use feed_recall::InvertedIndex;

/// Preference weights below this floor still contribute.
pub const MIN_PREFERENCE_WEIGHT: f64 = 0.1;

pub struct RetrievalInvertedIndex {
	pipeline: HybridPipeline,
}
impl RetrievalInvertedIndex {
	pub fn new(pipeline: HybridPipeline) -> Self {
		Self { pipeline }
	}
}

impl InvertedIndex for RetrievalInvertedIndex {
	fn query<'a>(
		&'a self,
		attributes: &'a [AttributePreference],
		k: usize,
	) -> BoxFuture<'a, feed_recall::Result<Vec<ScoredId>>> {
		Box::pin(async move {
			if attributes.is_empty() || k == 0 {
				return Ok(Vec::new());
			}

			let mut sorted: Vec<&AttributePreference> = attributes.iter().collect();

			sorted.sort_by(|left, right| cmp_f64_desc(left.score, right.score));

			let per_attribute_k = per_attribute_limit(k, attributes.len());
			let mut scores: HashMap<i64, f64> = HashMap::new();
			let mut strongest: HashMap<i64, (f64, &AttributePreference)> = HashMap::new();

			for preference in sorted {
				let context = RetrievalContext::global(per_attribute_k)
					.with_query(preference.attribute_value.as_str());
				let weight = preference.score.max(MIN_PREFERENCE_WEIGHT);

				for doc in self.pipeline.execute(&context).await {
					let contribution = doc.score * weight;

					*scores.entry(doc.doc_id).or_insert(0.0) += contribution;

					let best = strongest.entry(doc.doc_id).or_insert((contribution, preference));

					if contribution > best.0 {
						*best = (contribution, preference);
					}
				}
			}

			Ok(sort_scores_desc(scores, k)
				.into_iter()
				.map(|(id, score)| {
					let mut metadata = Metadata::new();

					if let Some((_, preference)) = strongest.get(&id) {
						metadata.insert(
							preference.attribute_key.clone(),
							preference.attribute_value.clone().into(),
						);
					}

					ScoredId { id, score, metadata }
				})
				.collect())
		})
	}
}

/// `max(1, ceil(1.5 · k / attribute_count))`.
pub fn per_attribute_limit(k: usize, attribute_count: usize) -> usize {
	let share = 1.5 * k as f64 / attribute_count.max(1) as f64;

	(share.ceil() as usize).max(1)
}
