use std::collections::HashMap;

use serde_json::Value;

use crate::{DiversityConfig, ItemCandidate};

/// Caps how many accepted candidates share one value of `config.attribute_key`.
///
/// Expects `sorted` in final rank order. Candidates without the attribute are always accepted.
/// Acceptance stops at `top_k`; with `fill_overflow`, capped candidates backfill any shortfall in
/// their original order.
pub fn apply_diversity(
	sorted: Vec<ItemCandidate>,
	config: &DiversityConfig,
	top_k: usize,
) -> Vec<ItemCandidate> {
	if !config.enabled {
		return sorted;
	}

	let mut accepted = Vec::with_capacity(top_k.min(sorted.len()));
	let mut overflow = Vec::new();
	let mut counts: HashMap<String, i64> = HashMap::new();

	for candidate in sorted {
		if accepted.len() >= top_k {
			break;
		}

		let Some(bucket) = bucket_of(&candidate, &config.attribute_key) else {
			accepted.push(candidate);

			continue;
		};
		let count = counts.entry(bucket).or_insert(0);

		if *count < config.max_per_attribute {
			*count += 1;

			accepted.push(candidate);
		} else {
			overflow.push(candidate);
		}
	}

	if config.fill_overflow {
		let shortfall = top_k.saturating_sub(accepted.len());

		accepted.extend(overflow.into_iter().take(shortfall));
	}

	accepted
}

fn bucket_of(candidate: &ItemCandidate, key: &str) -> Option<String> {
	match candidate.attributes.get(key)? {
		Value::Null => None,
		Value::String(value) => Some(value.clone()),
		other => Some(other.to_string()),
	}
}
