use std::{collections::HashSet, sync::Arc};

use super::{RecallStrategy, ScoreBoard};
use crate::{
	BoxFuture, CoOccurIndex, ItemCandidate, Result, SequenceStore, StrategyId, UserContext,
	UserInteraction,
};
use feed_domain::ScoredId;

/// Item-to-item expansion of the user's most recent interactions.
pub struct I2iStrategy {
	co_occur: Arc<dyn CoOccurIndex>,
	sequence_store: Option<Arc<dyn SequenceStore>>,
	seed_limit: usize,
	per_seed_limit: usize,
}
impl I2iStrategy {
	pub fn new(co_occur: Arc<dyn CoOccurIndex>, seed_limit: usize, per_seed_limit: usize) -> Self {
		Self { co_occur, sequence_store: None, seed_limit, per_seed_limit }
	}

	/// Consulted only when the context arrives without interactions.
	pub fn with_sequence_store(mut self, sequence_store: Arc<dyn SequenceStore>) -> Self {
		self.sequence_store = Some(sequence_store);

		self
	}

	async fn seeds(&self, context: &UserContext) -> Result<Vec<UserInteraction>> {
		if !context.interactions.is_empty() {
			return Ok(context.interactions.iter().take(self.seed_limit).cloned().collect());
		}

		match &self.sequence_store {
			Some(store) => store.recent_interactions(context.user_id, self.seed_limit).await,
			None => Ok(Vec::new()),
		}
	}
}

impl RecallStrategy for I2iStrategy {
	fn id(&self) -> StrategyId {
		StrategyId::I2i
	}

	fn recall<'a>(
		&'a self,
		context: &'a UserContext,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<ItemCandidate>>> {
		Box::pin(async move {
			if limit == 0 || self.seed_limit == 0 {
				return Ok(Vec::new());
			}

			let seeds = self.seeds(context).await?;

			if seeds.is_empty() {
				return Ok(Vec::new());
			}

			let mut history = context.recent_item_ids();

			history.extend(seeds.iter().map(|seed| seed.item_id));

			let mut board = ScoreBoard::default();

			for (index, seed) in seeds.iter().take(self.seed_limit).enumerate() {
				let weight = seed_weight(seed.weight, index, self.seed_limit);
				let related = self.co_occur.top_related(seed.item_id, self.per_seed_limit).await?;

				accumulate(&mut board, &related, &history, weight);
			}

			Ok(board.into_candidates(self.id(), limit))
		})
	}
}

/// `max(weight, 1) · exp(−index / seed_limit)`; the most recent seed weighs the most.
pub(crate) fn seed_weight(weight: f64, index: usize, seed_limit: usize) -> f64 {
	let base = if weight.is_nan() { 1.0 } else { weight.max(1.0) };

	base * (-(index as f64) / seed_limit.max(1) as f64).exp()
}

fn accumulate(
	board: &mut ScoreBoard,
	related: &[ScoredId],
	history: &HashSet<i64>,
	weight: f64,
) {
	for neighbor in related {
		if history.contains(&neighbor.id) {
			continue;
		}

		board.add(neighbor, neighbor.score * weight);
	}
}
