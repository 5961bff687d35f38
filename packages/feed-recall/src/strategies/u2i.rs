use std::sync::Arc;

use super::{RecallStrategy, pass_through};
use crate::{AnnIndex, BoxFuture, EmbeddingStore, ItemCandidate, Result, StrategyId, UserContext};

/// Nearest items to the user's embedding, scored by ANN similarity.
pub struct U2iStrategy {
	embeddings: Arc<dyn EmbeddingStore>,
	ann: Arc<dyn AnnIndex>,
}
impl U2iStrategy {
	pub fn new(embeddings: Arc<dyn EmbeddingStore>, ann: Arc<dyn AnnIndex>) -> Self {
		Self { embeddings, ann }
	}
}

impl RecallStrategy for U2iStrategy {
	fn id(&self) -> StrategyId {
		StrategyId::U2i
	}

	fn recall<'a>(
		&'a self,
		context: &'a UserContext,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<ItemCandidate>>> {
		Box::pin(async move {
			let Some(vector) = self.embeddings.user_vector(context.user_id).await? else {
				tracing::debug!(user_id = context.user_id, "No user vector; U2I skipped.");

				return Ok(Vec::new());
			};

			if vector.is_empty() || limit == 0 {
				return Ok(Vec::new());
			}

			let hits = self.ann.query(&vector, limit, &context.filters).await?;

			Ok(pass_through(hits, self.id(), limit))
		})
	}
}
