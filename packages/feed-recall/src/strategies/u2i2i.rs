use std::sync::Arc;

use super::{RecallStrategy, ScoreBoard};
use crate::{
	AnnIndex, BoxFuture, CoOccurIndex, EmbeddingStore, ItemCandidate, Result, StrategyId,
	UserContext,
};

/// Expands the user's nearest seed items through co-occurrence.
///
/// A candidate scores `Σ neighbor_score × seed_score` over the seeds that reach it. Recent
/// history is skipped, as is each seed within its own expansion.
pub struct U2i2iStrategy {
	embeddings: Arc<dyn EmbeddingStore>,
	ann: Arc<dyn AnnIndex>,
	co_occur: Arc<dyn CoOccurIndex>,
	seed_limit: usize,
	per_seed_limit: usize,
}
impl U2i2iStrategy {
	pub fn new(
		embeddings: Arc<dyn EmbeddingStore>,
		ann: Arc<dyn AnnIndex>,
		co_occur: Arc<dyn CoOccurIndex>,
		seed_limit: usize,
		per_seed_limit: usize,
	) -> Self {
		Self { embeddings, ann, co_occur, seed_limit, per_seed_limit }
	}
}

impl RecallStrategy for U2i2iStrategy {
	fn id(&self) -> StrategyId {
		StrategyId::U2i2i
	}

	fn recall<'a>(
		&'a self,
		context: &'a UserContext,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<ItemCandidate>>> {
		Box::pin(async move {
			let Some(vector) = self.embeddings.user_vector(context.user_id).await? else {
				return Ok(Vec::new());
			};

			if vector.is_empty() || limit == 0 {
				return Ok(Vec::new());
			}

			let seeds = self.ann.query(&vector, self.seed_limit, &context.filters).await?;
			let history = context.recent_item_ids();
			let mut board = ScoreBoard::default();

			for seed in &seeds {
				let related = self.co_occur.top_related(seed.id, self.per_seed_limit).await?;

				for neighbor in &related {
					if neighbor.id == seed.id || history.contains(&neighbor.id) {
						continue;
					}

					board.add(neighbor, neighbor.score * seed.score);
				}
			}

			Ok(board.into_candidates(self.id(), limit))
		})
	}
}
