use std::collections::BTreeMap;

use serde_json::Value;

use crate::{DiversityConfig, FusionConfig, RecallPlan, RecallRequest, StrategyId};
use feed_domain::Metadata;

pub const DIVERSITY_KEY_FILTER: &str = "diversityKey";
pub const DIVERSITY_LIMIT_FILTER: &str = "diversityLimit";
pub const DIVERSITY_FILL_OVERFLOW_FILTER: &str = "diversityFillOverflow";
pub const INTERLEAVE_CHANNELS_FILTER: &str = "interleaveChannels";

#[derive(Clone, Debug, Default)]
pub struct RecallPlanner {
	default_weights: BTreeMap<StrategyId, f64>,
}
impl RecallPlanner {
	pub fn new() -> Self {
		Self::default()
	}

	/// Channels missing from `weights` default to 1.0.
	pub fn with_default_weights(weights: BTreeMap<StrategyId, f64>) -> Self {
		Self { default_weights: weights }
	}

	/// Never fails. With no available channels the plan carries no quotas and a default fusion
	/// configuration.
	pub fn plan(&self, request: &RecallRequest, available: &[StrategyId]) -> RecallPlan {
		if available.is_empty() {
			return RecallPlan { quotas: BTreeMap::new(), fusion_config: FusionConfig::default() };
		}

		let quotas = allocate_quotas(request.top_k, available);
		let mut weights = BTreeMap::new();

		for id in available {
			weights.insert(*id, self.default_weights.get(id).copied().unwrap_or(1.0));
		}
		for (id, weight) in &request.channel_weights {
			weights.insert(*id, *weight);
		}

		let fusion_config = FusionConfig {
			top_k: request.top_k,
			deduplicate: true,
			weights,
			interleave_channels: filter_bool(&request.filters, INTERLEAVE_CHANNELS_FILTER, true),
			diversity: diversity_from_filters(&request.filters),
		};

		RecallPlan { quotas, fusion_config }
	}
}

/// Splits `top_k` across `strategies` so the quotas always sum to `top_k`.
///
/// Each channel gets `top_k / n`; the remainder goes one unit at a time to the earliest
/// channels in `strategies`. When `top_k < n` the trailing channels receive zero.
pub fn allocate_quotas(top_k: usize, strategies: &[StrategyId]) -> BTreeMap<StrategyId, usize> {
	let mut quotas = BTreeMap::new();

	if strategies.is_empty() {
		return quotas;
	}

	let base = top_k / strategies.len();
	let mut remaining = top_k - base * strategies.len();

	for id in strategies {
		let extra = usize::from(remaining > 0);

		remaining -= extra;

		quotas.insert(*id, base + extra);
	}

	quotas
}

pub fn diversity_from_filters(filters: &Metadata) -> DiversityConfig {
	let key = match filters.get(DIVERSITY_KEY_FILTER) {
		Some(Value::String(key)) => key.trim().to_string(),
		Some(Value::Null) | None => String::new(),
		Some(other) => other.to_string(),
	};

	if key.is_empty() {
		return DiversityConfig::disabled();
	}

	DiversityConfig::by_attribute(key, filter_int(filters, DIVERSITY_LIMIT_FILTER))
		.with_fill_overflow(filter_bool(filters, DIVERSITY_FILL_OVERFLOW_FILTER, false))
}

/// Absent keys take `default`; present values that do not read as a boolean are `false`.
pub fn filter_bool(filters: &Metadata, key: &str, default: bool) -> bool {
	match filters.get(key) {
		None | Some(Value::Null) => default,
		Some(Value::Bool(flag)) => *flag,
		Some(Value::Number(number)) => number.as_f64().is_some_and(|value| value != 0.0),
		Some(Value::String(raw)) => raw.trim().eq_ignore_ascii_case("true"),
		Some(_) => false,
	}
}

/// Numbers truncate toward zero; anything unreadable is 0.
pub fn filter_int(filters: &Metadata, key: &str) -> i64 {
	match filters.get(key) {
		Some(Value::Number(number)) =>
			number.as_i64().or_else(|| truncate_finite(number.as_f64())).unwrap_or(0),
		Some(Value::String(raw)) => {
			let raw = raw.trim();
			let whole = raw.parse::<i64>().ok();

			whole.or_else(|| truncate_finite(raw.parse::<f64>().ok())).unwrap_or(0)
		},
		_ => 0,
	}
}

fn truncate_finite(value: Option<f64>) -> Option<i64> {
	value.filter(|value| value.is_finite()).map(|value| value as i64)
}
