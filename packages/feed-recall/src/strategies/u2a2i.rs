use std::sync::Arc;

use super::{RecallStrategy, pass_through};
use crate::{
	BoxFuture, InvertedIndex, ItemCandidate, Result, StrategyId, UserContext,
	UserPreferenceService,
};

/// Items matching the user's strongest attribute preferences.
pub struct U2a2iStrategy {
	preferences: Arc<dyn UserPreferenceService>,
	inverted: Arc<dyn InvertedIndex>,
	attribute_limit: usize,
}
impl U2a2iStrategy {
	pub fn new(
		preferences: Arc<dyn UserPreferenceService>,
		inverted: Arc<dyn InvertedIndex>,
		attribute_limit: usize,
	) -> Self {
		Self { preferences, inverted, attribute_limit }
	}
}

impl RecallStrategy for U2a2iStrategy {
	fn id(&self) -> StrategyId {
		StrategyId::U2a2i
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

			let attributes =
				self.preferences.top_attributes(context.user_id, self.attribute_limit).await?;

			if attributes.is_empty() {
				return Ok(Vec::new());
			}

			let hits = self.inverted.query(&attributes, limit).await?;

			Ok(pass_through(hits, self.id(), limit))
		})
	}
}
