use std::sync::Arc;

use super::{RecallStrategy, ScoreBoard};
use crate::{BoxFuture, ItemCandidate, Result, StrategyId, UserContext, UserNeighborFinder};

/// Aggregates the recent items of similar users, each weighted by that user's similarity.
pub struct U2uStrategy {
	neighbors: Arc<dyn UserNeighborFinder>,
	neighbor_limit: usize,
}
impl U2uStrategy {
	pub fn new(neighbors: Arc<dyn UserNeighborFinder>, neighbor_limit: usize) -> Self {
		Self { neighbors, neighbor_limit }
	}
}

impl RecallStrategy for U2uStrategy {
	fn id(&self) -> StrategyId {
		StrategyId::U2u
	}

	fn recall<'a>(
		&'a self,
		context: &'a UserContext,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<ItemCandidate>>> {
		Box::pin(async move {
			if limit == 0 {
				return Ok(Vec::new());
			}

			let neighbors =
				self.neighbors.top_neighbors(context.user_id, self.neighbor_limit).await?;

			if neighbors.is_empty() {
				return Ok(Vec::new());
			}

			let history = context.recent_item_ids();
			let mut board = ScoreBoard::default();

			for neighbor in &neighbors {
				for item in &neighbor.top_items {
					if history.contains(&item.id) {
						continue;
					}

					board.add(item, item.score * neighbor.similarity);
				}
			}

			Ok(board.into_candidates(self.id(), limit))
		})
	}
}
