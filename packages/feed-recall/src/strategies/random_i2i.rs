use std::sync::{Arc, Mutex, PoisonError};

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{RecallStrategy, pass_through};
use crate::{
	BoxFuture, CoOccurIndex, ItemCandidate, ItemKind, ItemProvider, Result, StrategyId,
	UserContext,
};

/// Expands one randomly drawn item through co-occurrence.
pub struct RandomI2iStrategy {
	items: Arc<dyn ItemProvider>,
	co_occur: Arc<dyn CoOccurIndex>,
	rng: Mutex<StdRng>,
}
impl RandomI2iStrategy {
	pub fn new(items: Arc<dyn ItemProvider>, co_occur: Arc<dyn CoOccurIndex>) -> Self {
		Self { items, co_occur, rng: Mutex::new(StdRng::from_entropy()) }
	}

	/// Deterministic seed pick, for reproducible runs.
	pub fn with_seed(mut self, seed: u64) -> Self {
		self.rng = Mutex::new(StdRng::seed_from_u64(seed));

		self
	}

	fn pick(&self, len: usize) -> usize {
		let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

		rng.gen_range(0..len)
	}
}

impl RecallStrategy for RandomI2iStrategy {
	fn id(&self) -> StrategyId {
		StrategyId::RandomI2i
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

			let pool = self.items.ls(context, ItemKind::Random, limit).await?;

			if pool.is_empty() {
				return Ok(Vec::new());
			}

			let seed = pool[self.pick(pool.len())].id;
			let related = self.co_occur.top_related(seed, limit).await?;

			Ok(pass_through(related, self.id(), limit))
		})
	}
}
