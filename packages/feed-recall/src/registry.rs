use std::{
	collections::{HashMap, HashSet},
	sync::Arc,
};

use crate::{Error, RecallStrategy, Result, StrategyId};

/// Strategies keyed by channel, remembered in registration order.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
	order: Vec<StrategyId>,
	strategies: HashMap<StrategyId, Arc<dyn RecallStrategy>>,
	scenes: HashMap<String, Vec<StrategyId>>,
}
impl StrategyRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registering the same channel twice replaces the implementation but keeps its position.
	pub fn register(&mut self, strategy: Arc<dyn RecallStrategy>) {
		let id = strategy.id();

		if self.strategies.insert(id, strategy).is_none() {
			self.order.push(id);
		}
	}

	pub fn with_strategy(mut self, strategy: Arc<dyn RecallStrategy>) -> Self {
		self.register(strategy);

		self
	}

	/// Restricts `scene` to the listed channels. Scenes without an entry see every channel.
	pub fn with_scene(mut self, scene: impl Into<String>, ids: Vec<StrategyId>) -> Self {
		self.scenes.insert(scene.into(), ids);

		self
	}

	pub fn get(&self, id: StrategyId) -> Result<Arc<dyn RecallStrategy>> {
		self.strategies.get(&id).cloned().ok_or_else(|| Error::Configuration {
			message: format!("No recall strategy is registered for {id}."),
		})
	}

	pub fn registered(&self) -> &[StrategyId] {
		&self.order
	}

	/// Usable channels for `scene`, in registration order.
	pub fn available(&self, scene: &str) -> Vec<StrategyId> {
		let Some(allowed) = self.scenes.get(scene) else {
			return self.order.clone();
		};
		let allowed: HashSet<StrategyId> = allowed.iter().copied().collect();

		self.order.iter().copied().filter(|id| allowed.contains(id)).collect()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}
}
