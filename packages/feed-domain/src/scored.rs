use std::{cmp::Ordering, collections::HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Metadata = Map<String, Value>;

/// An identifier with a channel-relative score, as returned by every index collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredId {
	pub id: i64,
	pub score: f64,
	#[serde(default)]
	pub metadata: Metadata,
}
impl ScoredId {
	pub fn new(id: i64, score: f64) -> Self {
		Self { id, score, metadata: Metadata::new() }
	}

	pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.metadata.insert(key.to_string(), value.into());

		self
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributePreference {
	pub attribute_key: String,
	pub attribute_value: String,
	pub score: f64,
}

pub fn cmp_f64_desc(a: f64, b: f64) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

/// Drains an accumulator into `(id, score)` pairs, highest score first, ties by ascending id.
pub fn sort_scores_desc(scores: HashMap<i64, f64>, limit: usize) -> Vec<(i64, f64)> {
	let mut entries: Vec<(i64, f64)> = scores.into_iter().collect();

	entries.sort_by(|left, right| cmp_f64_desc(left.1, right.1).then_with(|| left.0.cmp(&right.0)));
	entries.truncate(limit);

	entries
}
