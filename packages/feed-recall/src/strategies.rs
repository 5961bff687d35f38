//! The seven recall channels. Each turns a user context into scored candidates and returns an
//! empty list when the user carries too little signal.

mod i2i;
mod latest;
mod random_i2i;
mod u2a2i;
mod u2i;
mod u2i2i;
mod u2u;

pub use i2i::I2iStrategy;
pub use latest::LatestStrategy;
pub use random_i2i::RandomI2iStrategy;
pub use u2a2i::U2a2iStrategy;
pub use u2i::U2iStrategy;
pub use u2i2i::U2i2iStrategy;
pub use u2u::U2uStrategy;

use std::collections::HashMap;

use crate::{BoxFuture, ItemCandidate, Result, StrategyId, UserContext};
use feed_domain::{Metadata, ScoredId, sort_scores_desc};

pub trait RecallStrategy
where
	Self: Send + Sync,
{
	fn id(&self) -> StrategyId;

	fn recall<'a>(
		&'a self,
		context: &'a UserContext,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<ItemCandidate>>>;
}

/// Per-item score accumulator. Attributes come from the first hit seen for an item.
#[derive(Debug, Default)]
struct ScoreBoard {
	scores: HashMap<i64, f64>,
	attributes: HashMap<i64, Metadata>,
}
impl ScoreBoard {
	fn add(&mut self, hit: &ScoredId, contribution: f64) {
		*self.scores.entry(hit.id).or_insert(0.0) += contribution;

		self.attributes.entry(hit.id).or_insert_with(|| hit.metadata.clone());
	}

	fn into_candidates(self, source: StrategyId, limit: usize) -> Vec<ItemCandidate> {
		let Self { scores, mut attributes } = self;

		sort_scores_desc(scores, limit)
			.into_iter()
			.map(|(item_id, score)| ItemCandidate {
				item_id,
				score,
				source,
				attributes: attributes.remove(&item_id).unwrap_or_default(),
			})
			.collect()
	}
}

fn pass_through(hits: Vec<ScoredId>, source: StrategyId, limit: usize) -> Vec<ItemCandidate> {
	hits.into_iter().take(limit).map(|hit| ItemCandidate::from_scored(hit, source)).collect()
}
