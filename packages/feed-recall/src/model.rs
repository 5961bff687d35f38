use std::{
	collections::{BTreeMap, HashSet},
	fmt::{Display, Formatter},
	str::FromStr,
	time::Duration,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result};
use feed_domain::{Metadata, ScoredId};

/// Pre-fusion output of every dispatched channel, in natural channel order.
pub type ChannelResults = BTreeMap<StrategyId, Vec<ItemCandidate>>;

/// Closed set of recall channels. The declaration order is the natural iteration order used by
/// channel maps and interleave buckets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StrategyId {
	#[serde(rename = "I2I")]
	I2i,
	#[serde(rename = "U2I")]
	U2i,
	#[serde(rename = "U2I2I")]
	U2i2i,
	#[serde(rename = "U2A2I")]
	U2a2i,
	#[serde(rename = "U2U")]
	U2u,
	#[serde(rename = "LATEST")]
	Latest,
	#[serde(rename = "RANDOM_I2I")]
	RandomI2i,
}
impl StrategyId {
	pub const ALL: [Self; 7] =
		[Self::I2i, Self::U2i, Self::U2i2i, Self::U2a2i, Self::U2u, Self::Latest, Self::RandomI2i];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::I2i => "I2I",
			Self::U2i => "U2I",
			Self::U2i2i => "U2I2I",
			Self::U2a2i => "U2A2I",
			Self::U2u => "U2U",
			Self::Latest => "LATEST",
			Self::RandomI2i => "RANDOM_I2I",
		}
	}

	/// Lower-case name used by `recall.*` configuration keys.
	pub fn config_name(self) -> &'static str {
		match self {
			Self::I2i => "i2i",
			Self::U2i => "u2i",
			Self::U2i2i => "u2i2i",
			Self::U2a2i => "u2a2i",
			Self::U2u => "u2u",
			Self::Latest => "latest",
			Self::RandomI2i => "random_i2i",
		}
	}
}
impl Display for StrategyId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for StrategyId {
	type Err = Error;

	fn from_str(value: &str) -> Result<Self> {
		let normalized = value.trim().to_ascii_lowercase();

		Self::ALL.into_iter().find(|id| id.config_name() == normalized).ok_or_else(|| {
			Error::InvalidRequest { message: format!("Unknown recall strategy {value:?}.") }
		})
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemCandidate {
	pub item_id: i64,
	pub score: f64,
	pub source: StrategyId,
	pub attributes: Metadata,
}
impl ItemCandidate {
	pub fn new(item_id: i64, score: f64, source: StrategyId) -> Self {
		Self { item_id, score, source, attributes: Metadata::new() }
	}

	/// Carries the collaborator's metadata through as candidate attributes.
	pub fn from_scored(scored: ScoredId, source: StrategyId) -> Self {
		Self { item_id: scored.id, score: scored.score, source, attributes: scored.metadata }
	}

	pub fn with_score(self, score: f64) -> Self {
		Self { score, ..self }
	}

	pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.attributes.insert(key.to_string(), value.into());

		self
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserInteraction {
	pub item_id: i64,
	#[serde(default)]
	pub duration_seconds: f64,
	#[serde(default = "default_interaction_weight")]
	pub weight: f64,
	#[serde(default, with = "feed_domain::time_serde::option")]
	pub timestamp: Option<OffsetDateTime>,
}
impl UserInteraction {
	pub fn new(item_id: i64, weight: f64) -> Self {
		Self { item_id, duration_seconds: 0.0, weight, timestamp: None }
	}
}

/// Read-only per-request view shared by every running strategy.
#[derive(Clone, Debug)]
pub struct UserContext {
	pub user_id: i64,
	pub scene: String,
	/// Most recent first.
	pub interactions: Vec<UserInteraction>,
	pub filters: Metadata,
	pub request_time: OffsetDateTime,
}
impl UserContext {
	pub fn from_request(request: &RecallRequest, interactions: Vec<UserInteraction>) -> Self {
		Self {
			user_id: request.user_id,
			scene: request.scene.clone(),
			interactions,
			filters: request.filters.clone(),
			request_time: request.request_time,
		}
	}

	pub fn recent_item_ids(&self) -> HashSet<i64> {
		self.interactions.iter().map(|interaction| interaction.item_id).collect()
	}
}

#[derive(Clone, Debug)]
pub struct RecallRequest {
	pub user_id: i64,
	pub scene: String,
	pub top_k: usize,
	pub filters: Metadata,
	pub diagnostics_requested: bool,
	pub request_time: OffsetDateTime,
	/// Per-request channel weight overrides, applied over the configured defaults.
	pub channel_weights: BTreeMap<StrategyId, f64>,
}
impl RecallRequest {
	pub fn new(user_id: i64, scene: impl Into<String>, top_k: usize) -> Self {
		Self {
			user_id,
			scene: scene.into(),
			top_k,
			filters: Metadata::new(),
			diagnostics_requested: false,
			request_time: OffsetDateTime::now_utc(),
			channel_weights: BTreeMap::new(),
		}
	}

	pub fn with_filter(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.filters.insert(key.to_string(), value.into());

		self
	}

	pub fn with_diagnostics(mut self, requested: bool) -> Self {
		self.diagnostics_requested = requested;

		self
	}

	pub fn with_request_time(mut self, request_time: OffsetDateTime) -> Self {
		self.request_time = request_time;

		self
	}

	pub fn with_channel_weight(mut self, id: StrategyId, weight: f64) -> Self {
		self.channel_weights.insert(id, weight);

		self
	}

	/// Applies `name -> weight` overrides keyed by configuration name.
	pub fn with_channel_weight_overrides<'a, I>(mut self, overrides: I) -> Result<Self>
	where
		I: IntoIterator<Item = (&'a str, f64)>,
	{
		for (name, weight) in overrides {
			let id = name.parse::<StrategyId>()?;

			if !weight.is_finite() || weight < 0.0 {
				return Err(Error::InvalidRequest {
					message: format!("Weight for {id} must be a finite number zero or greater."),
				});
			}

			self.channel_weights.insert(id, weight);
		}

		Ok(self)
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DiversityConfig {
	pub attribute_key: String,
	/// Zero or less with `enabled` accepts no candidate that carries the attribute.
	pub max_per_attribute: i64,
	pub fill_overflow: bool,
	pub enabled: bool,
}
impl DiversityConfig {
	pub fn disabled() -> Self {
		Self::default()
	}

	pub fn by_attribute(attribute_key: impl Into<String>, max_per_attribute: i64) -> Self {
		Self {
			attribute_key: attribute_key.into(),
			max_per_attribute,
			fill_overflow: false,
			enabled: true,
		}
	}

	pub fn with_fill_overflow(mut self, fill_overflow: bool) -> Self {
		self.fill_overflow = fill_overflow;

		self
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FusionConfig {
	pub top_k: usize,
	pub deduplicate: bool,
	pub weights: BTreeMap<StrategyId, f64>,
	pub interleave_channels: bool,
	pub diversity: DiversityConfig,
}
impl FusionConfig {
	pub fn new(top_k: usize) -> Self {
		Self { top_k, ..Self::default() }
	}

	pub fn weight(&self, source: StrategyId) -> f64 {
		self.weights.get(&source).copied().unwrap_or(1.0)
	}
}
impl Default for FusionConfig {
	fn default() -> Self {
		Self {
			top_k: 0,
			deduplicate: true,
			weights: BTreeMap::new(),
			interleave_channels: true,
			diversity: DiversityConfig::disabled(),
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecallPlan {
	pub quotas: BTreeMap<StrategyId, usize>,
	pub fusion_config: FusionConfig,
}
impl RecallPlan {
	pub fn total_quota(&self) -> usize {
		self.quotas.values().sum()
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct RecallDiagnostics {
	pub trace_id: Uuid,
	pub quotas: BTreeMap<StrategyId, usize>,
	pub per_channel_counts: BTreeMap<StrategyId, usize>,
	pub failed_channels: Vec<StrategyId>,
	pub contributing_sources: BTreeMap<i64, Vec<StrategyId>>,
}

#[derive(Clone, Debug)]
pub struct RecallResponse {
	pub fused: Vec<ItemCandidate>,
	pub channel_results: ChannelResults,
	pub latency: Duration,
	/// Present only when the request asked for diagnostics.
	pub diagnostics: Option<RecallDiagnostics>,
}
impl RecallResponse {
	pub fn item_ids(&self) -> Vec<i64> {
		self.fused.iter().map(|candidate| candidate.item_id).collect()
	}
}

fn default_interaction_weight() -> f64 {
	1.0
}
