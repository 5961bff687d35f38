use std::sync::Arc;

use super::{RecallStrategy, pass_through};
use crate::{BoxFuture, ItemCandidate, ItemKind, ItemProvider, Result, StrategyId, UserContext};

pub struct LatestStrategy {
	items: Arc<dyn ItemProvider>,
}
impl LatestStrategy {
	pub fn new(items: Arc<dyn ItemProvider>) -> Self {
		Self { items }
	}
}

impl RecallStrategy for LatestStrategy {
	fn id(&self) -> StrategyId {
		StrategyId::Latest
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

			let hits = self.items.ls(context, ItemKind::Latest, limit).await?;

			Ok(pass_through(hits, self.id(), limit))
		})
	}
}
