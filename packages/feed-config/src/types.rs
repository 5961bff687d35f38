use std::{collections::HashMap, path::PathBuf};

use serde::Deserialize;

/// Channel names accepted by `recall.strategies`, `recall.scenes`, `recall.weights`, and
/// `recall.cache.strategies`.
pub const STRATEGY_NAMES: [&str; 7] =
	["i2i", "u2i", "u2i2i", "u2a2i", "u2u", "latest", "random_i2i"];

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	#[serde(default)]
	pub recall: Recall,
	#[serde(default)]
	pub fusion: Fusion,
	#[serde(default)]
	pub retrieval: Retrieval,
	pub snapshot: Option<Snapshot>,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Recall {
	/// How many recent interactions the context factory loads per request.
	pub context_interactions: u32,
	/// Upper bound on strategies running at once across all in-flight requests.
	pub max_concurrency: u32,
	/// Optional. When unset the engine waits for every strategy to finish.
	pub strategy_timeout_ms: Option<u64>,
	pub score_mapping: String,
	/// Registration order; quota remainders are handed out in this order.
	pub strategies: Vec<String>,
	/// Optional. Scene label to the subset of strategies served for it.
	pub scenes: HashMap<String, Vec<String>>,
	/// Optional. Default per-channel fusion weights; unlisted channels weigh 1.0.
	pub weights: HashMap<String, f64>,
	pub i2i: ItemSeedExpansion,
	pub u2i2i: UserSeedExpansion,
	pub u2a2i: AttributeRecall,
	pub u2u: NeighborRecall,
	pub cache: RecallCache,
}
impl Default for Recall {
	fn default() -> Self {
		Self {
			context_interactions: 150,
			max_concurrency: 16,
			strategy_timeout_ms: None,
			score_mapping: "off".to_string(),
			strategies: STRATEGY_NAMES.iter().map(|name| name.to_string()).collect(),
			scenes: HashMap::new(),
			weights: HashMap::new(),
			i2i: ItemSeedExpansion::default(),
			u2i2i: UserSeedExpansion::default(),
			u2a2i: AttributeRecall::default(),
			u2u: NeighborRecall::default(),
			cache: RecallCache::default(),
		}
	}
}

/// Seed fan-out for I2I, which expands the request's recent items.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct ItemSeedExpansion {
	pub seed_limit: u32,
	pub per_seed_limit: u32,
}
impl Default for ItemSeedExpansion {
	fn default() -> Self {
		Self { seed_limit: 3, per_seed_limit: 20 }
	}
}

/// Seed fan-out for U2I2I, which expands the user's nearest items.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct UserSeedExpansion {
	pub seed_limit: u32,
	pub per_seed_limit: u32,
}
impl Default for UserSeedExpansion {
	fn default() -> Self {
		Self { seed_limit: 3, per_seed_limit: 10 }
	}
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct AttributeRecall {
	pub attribute_limit: u32,
}
impl Default for AttributeRecall {
	fn default() -> Self {
		Self { attribute_limit: 10 }
	}
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct NeighborRecall {
	pub neighbor_limit: u32,
}
impl Default for NeighborRecall {
	fn default() -> Self {
		Self { neighbor_limit: 50 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RecallCache {
	pub enabled: bool,
	pub ttl_seconds: u64,
	pub strategies: Vec<String>,
}
impl Default for RecallCache {
	fn default() -> Self {
		Self {
			enabled: false,
			ttl_seconds: 300,
			strategies: vec!["u2i".to_string(), "u2i2i".to_string()],
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Fusion {
	/// Share of the final score taken by freshness; 0 disables the blend.
	pub freshness_weight: f64,
	pub half_life_hours: f64,
	/// Freshness assumed for items whose publish time is unknown.
	pub default_freshness: f64,
}
impl Default for Fusion {
	fn default() -> Self {
		Self { freshness_weight: 0.0, half_life_hours: 48.0, default_freshness: 0.0 }
	}
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub lexical_weight: f64,
	pub vector_weight: f64,
	pub lexical_top_k: u32,
	pub vector_top_k: u32,
	pub fusion_top_k: u32,
	pub similarity_threshold: f64,
	pub freshness_weight: f64,
	pub half_life_hours: f64,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			lexical_weight: 0.4,
			vector_weight: 0.6,
			lexical_top_k: 100,
			vector_top_k: 100,
			fusion_top_k: 200,
			similarity_threshold: 0.3,
			freshness_weight: 0.3,
			half_life_hours: 48.0,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Snapshot {
	pub path: PathBuf,
}
