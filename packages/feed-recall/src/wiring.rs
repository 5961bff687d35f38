//! Startup wiring from `feed_config` settings and a set of collaborators.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use crate::{
	AnnIndex, CachedStrategy, CoOccurIndex, DefaultUserContextFactory, EmbeddingStore,
	EngineSettings, Error, FreshnessSettings, FusionEngine, InvertedIndex, ItemFreshnessProvider,
	ItemProvider, MemoryRecallCache, RecallCache, RecallEngine, RecallPlanner, RecallStrategy,
	Result, SequenceStore, StrategyId, StrategyRegistry, UserNeighborFinder,
	UserPreferenceService,
	strategies::{
		I2iStrategy, LatestStrategy, RandomI2iStrategy, U2a2iStrategy, U2iStrategy, U2i2iStrategy,
		U2uStrategy,
	},
};
use feed_config::{Config, Recall};
use feed_domain::ScoreMapping;

#[derive(Clone)]
pub struct Collaborators {
	pub sequence_store: Arc<dyn SequenceStore>,
	pub embeddings: Arc<dyn EmbeddingStore>,
	pub ann: Arc<dyn AnnIndex>,
	pub co_occur: Arc<dyn CoOccurIndex>,
	pub inverted: Arc<dyn InvertedIndex>,
	pub preferences: Arc<dyn UserPreferenceService>,
	pub neighbors: Arc<dyn UserNeighborFinder>,
	pub freshness: Arc<dyn ItemFreshnessProvider>,
	pub items: Arc<dyn ItemProvider>,
}

/// Registers `recall.strategies` in order, wrapping cached channels when a cache is supplied.
pub fn build_registry(
	cfg: &Recall,
	collaborators: &Collaborators,
	cache: Option<Arc<dyn RecallCache>>,
) -> Result<StrategyRegistry> {
	let cached = parse_names("recall.cache.strategies", &cfg.cache.strategies)?;
	let mut registry = StrategyRegistry::new();

	for id in parse_names("recall.strategies", &cfg.strategies)? {
		let strategy = build_strategy(id, cfg, collaborators);
		let strategy: Arc<dyn RecallStrategy> = match cache.as_ref() {
			Some(cache) if cached.contains(&id) =>
				Arc::new(CachedStrategy::new(strategy, Arc::clone(cache))),
			_ => strategy,
		};

		registry.register(strategy);
	}

	for (scene, names) in &cfg.scenes {
		let ids = parse_names(&format!("recall.scenes.{scene}"), names)?;

		registry = registry.with_scene(scene.clone(), ids);
	}

	Ok(registry)
}

pub fn build_engine(cfg: &Config, collaborators: Collaborators) -> Result<RecallEngine> {
	let cache: Option<Arc<dyn RecallCache>> = cfg.recall.cache.enabled.then(|| {
		Arc::new(MemoryRecallCache::new(Duration::from_secs(cfg.recall.cache.ttl_seconds)))
			as Arc<dyn RecallCache>
	});
	let registry = build_registry(&cfg.recall, &collaborators, cache)?;
	let mut default_weights = BTreeMap::new();

	for (name, weight) in &cfg.recall.weights {
		default_weights.insert(parse_name("recall.weights", name)?, *weight);
	}

	let score_mapping = parse_score_mapping(&cfg.recall.score_mapping)?;
	let settings = EngineSettings {
		max_concurrency: cfg.recall.max_concurrency as usize,
		strategy_timeout: cfg.recall.strategy_timeout_ms.map(Duration::from_millis),
		score_mapping,
	};
	let fusion = FusionEngine::new(FreshnessSettings {
		weight: cfg.fusion.freshness_weight,
		half_life_hours: cfg.fusion.half_life_hours,
		default_freshness: cfg.fusion.default_freshness,
	})
	.with_freshness_provider(Arc::clone(&collaborators.freshness));
	let context_factory = Arc::new(DefaultUserContextFactory::new(
		Arc::clone(&collaborators.sequence_store),
		cfg.recall.context_interactions as usize,
	));

	tracing::info!(
		strategies = ?registry.registered(),
		max_concurrency = settings.max_concurrency,
		score_mapping = score_mapping.as_str(),
		"Recall engine ready."
	);

	Ok(RecallEngine::new(
		registry,
		RecallPlanner::with_default_weights(default_weights),
		context_factory,
		fusion,
		settings,
	))
}

fn build_strategy(
	id: StrategyId,
	cfg: &Recall,
	collaborators: &Collaborators,
) -> Arc<dyn RecallStrategy> {
	let c = collaborators;

	match id {
		StrategyId::I2i => Arc::new(
			I2iStrategy::new(
				Arc::clone(&c.co_occur),
				cfg.i2i.seed_limit as usize,
				cfg.i2i.per_seed_limit as usize,
			)
			.with_sequence_store(Arc::clone(&c.sequence_store)),
		),
		StrategyId::U2i =>
			Arc::new(U2iStrategy::new(Arc::clone(&c.embeddings), Arc::clone(&c.ann))),
		StrategyId::U2i2i => Arc::new(U2i2iStrategy::new(
			Arc::clone(&c.embeddings),
			Arc::clone(&c.ann),
			Arc::clone(&c.co_occur),
			cfg.u2i2i.seed_limit as usize,
			cfg.u2i2i.per_seed_limit as usize,
		)),
		StrategyId::U2a2i => Arc::new(U2a2iStrategy::new(
			Arc::clone(&c.preferences),
			Arc::clone(&c.inverted),
			cfg.u2a2i.attribute_limit as usize,
		)),
		StrategyId::U2u =>
			Arc::new(U2uStrategy::new(Arc::clone(&c.neighbors), cfg.u2u.neighbor_limit as usize)),
		StrategyId::Latest => Arc::new(LatestStrategy::new(Arc::clone(&c.items))),
		StrategyId::RandomI2i =>
			Arc::new(RandomI2iStrategy::new(Arc::clone(&c.items), Arc::clone(&c.co_occur))),
	}
}

fn parse_score_mapping(raw: &str) -> Result<ScoreMapping> {
	raw.parse::<ScoreMapping>().map_err(|message| Error::Configuration {
		message: format!("recall.score_mapping: {message}."),
	})
}

fn parse_names(label: &str, names: &[String]) -> Result<Vec<StrategyId>> {
	names.iter().map(|name| parse_name(label, name)).collect()
}

fn parse_name(label: &str, name: &str) -> Result<StrategyId> {
	name.parse::<StrategyId>().map_err(|_| Error::Configuration {
		message: format!("{label} names unknown strategy {name:?}."),
	})
}
