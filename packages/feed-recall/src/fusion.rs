//! Channel fusion: weight, deduplicate, blend freshness, sort, cap diversity, interleave, and
//! truncate, in that order.

mod diversity;
mod interleave;

pub use diversity::apply_diversity;
pub use interleave::interleave;

use std::{
	collections::{BTreeMap, HashMap},
	sync::Arc,
};

use time::OffsetDateTime;

use crate::{
	ChannelResults, FusionConfig, ItemCandidate, ItemFreshnessProvider, RecallRequest, StrategyId,
};
use feed_domain::{FreshnessDecay, blend_freshness, cmp_f64_desc};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FreshnessSettings {
	/// 0 disables the blend.
	pub weight: f64,
	pub half_life_hours: f64,
	/// Used for items whose publish instant is unknown.
	pub default_freshness: f64,
}
impl Default for FreshnessSettings {
	fn default() -> Self {
		Self { weight: 0.0, half_life_hours: 48.0, default_freshness: 0.0 }
	}
}

pub struct FusionContext<'a> {
	pub request: &'a RecallRequest,
	pub config: &'a FusionConfig,
}

#[derive(Clone, Debug, Default)]
pub struct FusionOutcome {
	pub candidates: Vec<ItemCandidate>,
	/// Every channel that produced an item, in natural channel order.
	pub contributing_sources: BTreeMap<i64, Vec<StrategyId>>,
}

#[derive(Clone)]
pub struct FusionEngine {
	freshness: FreshnessSettings,
	decay: FreshnessDecay,
	freshness_provider: Option<Arc<dyn ItemFreshnessProvider>>,
}
impl FusionEngine {
	pub fn new(freshness: FreshnessSettings) -> Self {
		Self {
			freshness,
			decay: FreshnessDecay::from_half_life_hours(freshness.half_life_hours),
			freshness_provider: None,
		}
	}

	pub fn with_freshness_provider(mut self, provider: Arc<dyn ItemFreshnessProvider>) -> Self {
		self.freshness_provider = Some(provider);

		self
	}

	pub async fn fuse(
		&self,
		channel_results: &ChannelResults,
		context: &FusionContext<'_>,
	) -> Vec<ItemCandidate> {
		self.fuse_with_sources(channel_results, context).await.candidates
	}

	pub async fn fuse_with_sources(
		&self,
		channel_results: &ChannelResults,
		context: &FusionContext<'_>,
	) -> FusionOutcome {
		let config = context.config;
		let (merged, contributing_sources) = weight_and_merge(channel_results, config);
		let mut ranked = if self.freshness.weight > 0.0 {
			self.apply_freshness(merged, context.request.request_time).await
		} else {
			merged
		};

		ranked.sort_by(|left, right| cmp_f64_desc(left.score, right.score));

		let diversified = apply_diversity(ranked, &config.diversity, config.top_k);
		let mut candidates = if config.interleave_channels {
			interleave(diversified, config.top_k)
		} else {
			diversified
		};

		candidates.truncate(config.top_k);

		FusionOutcome { candidates, contributing_sources }
	}

	async fn apply_freshness(
		&self,
		candidates: Vec<ItemCandidate>,
		reference: OffsetDateTime,
	) -> Vec<ItemCandidate> {
		let published = self.published_at(&candidates).await;
		let default_freshness = self.freshness.default_freshness.clamp(0.0, 1.0);

		candidates
			.into_iter()
			.map(|candidate| {
				let freshness = published
					.get(&candidate.item_id)
					.map(|at| self.decay.score(*at, reference))
					.unwrap_or(default_freshness);
				let score = blend_freshness(candidate.score, freshness, self.freshness.weight);

				candidate.with_score(score)
			})
			.collect()
	}

	async fn published_at(&self, candidates: &[ItemCandidate]) -> HashMap<i64, OffsetDateTime> {
		let Some(provider) = self.freshness_provider.as_ref() else {
			return HashMap::new();
		};

		if candidates.is_empty() {
			return HashMap::new();
		}

		let item_ids: Vec<i64> = candidates.iter().map(|candidate| candidate.item_id).collect();

		match provider.published_at(&item_ids).await {
			Ok(published) => published,
			Err(err) => {
				tracing::warn!(
					error = %err,
					size = item_ids.len(),
					"Freshness lookup failed; using default freshness."
				);

				HashMap::new()
			},
		}
	}
}

/// Applies channel weights and, when enabled, keeps the highest-scoring copy of each item.
/// On equal scores the first copy seen wins.
pub fn weight_and_merge(
	channel_results: &ChannelResults,
	config: &FusionConfig,
) -> (Vec<ItemCandidate>, BTreeMap<i64, Vec<StrategyId>>) {
	let mut merged: Vec<ItemCandidate> = Vec::new();
	let mut positions: HashMap<i64, usize> = HashMap::new();
	let mut sources: BTreeMap<i64, Vec<StrategyId>> = BTreeMap::new();

	for candidates in channel_results.values() {
		for candidate in candidates {
			let weight = config.weight(candidate.source);
			let weighted = candidate.clone().with_score(candidate.score * weight);
			let contributors = sources.entry(weighted.item_id).or_default();

			if !contributors.contains(&weighted.source) {
				contributors.push(weighted.source);
			}
			if !config.deduplicate {
				merged.push(weighted);

				continue;
			}

			match positions.get(&weighted.item_id) {
				Some(&index) =>
					if weighted.score > merged[index].score {
						merged[index] = weighted;
					},
				None => {
					positions.insert(weighted.item_id, merged.len());
					merged.push(weighted);
				},
			}
		}
	}

	for contributors in sources.values_mut() {
		contributors.sort();
	}

	(merged, sources)
}
