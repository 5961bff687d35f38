use std::collections::{BTreeMap, VecDeque};

use crate::{ItemCandidate, StrategyId};

/// Round-robin across per-channel buckets in natural channel order, keeping each bucket's
/// internal rank, until `limit` items are emitted or every bucket is drained.
pub fn interleave(candidates: Vec<ItemCandidate>, limit: usize) -> Vec<ItemCandidate> {
	let total = candidates.len();
	let mut buckets: BTreeMap<StrategyId, VecDeque<ItemCandidate>> = BTreeMap::new();

	for candidate in candidates {
		buckets.entry(candidate.source).or_default().push_back(candidate);
	}

	let mut out = Vec::with_capacity(limit.min(total));

	while out.len() < limit {
		let mut emitted = false;

		for bucket in buckets.values_mut() {
			if out.len() >= limit {
				break;
			}
			if let Some(candidate) = bucket.pop_front() {
				out.push(candidate);

				emitted = true;
			}
		}

		if !emitted {
			break;
		}
	}

	out
}
