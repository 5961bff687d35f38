use std::{
	cmp::Ordering,
	collections::{BTreeMap, HashMap},
	fs,
	path::Path,
	sync::Mutex,
};

use rand::{SeedableRng, rngs::StdRng};

use crate::{Error, ItemRecord, Result, Snapshot, UserRecord};
use feed_domain::{FreshnessDecay, Metadata, ScoredId, cmp_f64_desc, cosine_similarity};
use feed_retrieval::{MemoryLexicalIndex, MemoryVectorIndex};

/// Recent items taken from each neighbor for user-to-user recall.
pub const NEIGHBOR_ITEM_LIMIT: usize = 30;

const DEFAULT_HALF_LIFE_HOURS: f64 = 48.0;

/// Read-only catalog serving every recall and retrieval collaborator from memory.
pub struct MemoryStore {
	pub(crate) items: BTreeMap<i64, ItemRecord>,
	pub(crate) users: HashMap<i64, UserRecord>,
	pub(crate) co_occurrence: HashMap<i64, Vec<ScoredId>>,
	pub(crate) lexical: MemoryLexicalIndex,
	pub(crate) vectors: MemoryVectorIndex,
	pub(crate) decay: FreshnessDecay,
	pub(crate) rng: Mutex<StdRng>,
}
impl MemoryStore {
	pub fn load(path: &Path) -> Result<Self> {
		let raw = fs::read_to_string(path)
			.map_err(|source| Error::ReadSnapshot { path: path.to_path_buf(), source })?;
		let snapshot: Snapshot = serde_json::from_str(&raw)
			.map_err(|source| Error::ParseSnapshot { path: path.to_path_buf(), source })?;
		let store = Self::from_snapshot(snapshot)?;

		tracing::info!(
			path = %path.display(),
			items = store.items.len(),
			users = store.users.len(),
			"Snapshot loaded."
		);

		Ok(store)
	}

	pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
		snapshot.validate()?;

		let Snapshot { items, users, co_occurrence } = snapshot;
		let lexical = MemoryLexicalIndex::new(items.iter().map(ItemRecord::lexical_document));
		let vectors = MemoryVectorIndex::new(items.iter().map(ItemRecord::vector_document));
		let users = users
			.into_iter()
			.map(|mut user| {
				sort_most_recent_first(&mut user);

				(user.id, user)
			})
			.collect();

		Ok(Self {
			items: items.into_iter().map(|item| (item.id, item)).collect(),
			users,
			co_occurrence,
			lexical,
			vectors,
			decay: FreshnessDecay::from_half_life_hours(DEFAULT_HALF_LIFE_HOURS),
			rng: Mutex::new(StdRng::from_entropy()),
		})
	}

	/// Deterministic random sampling for the Random item listing.
	pub fn with_seed(mut self, seed: u64) -> Self {
		self.rng = Mutex::new(StdRng::seed_from_u64(seed));

		self
	}

	pub fn with_half_life_hours(mut self, half_life_hours: f64) -> Self {
		self.decay = FreshnessDecay::from_half_life_hours(half_life_hours);

		self
	}

	pub fn item(&self, item_id: i64) -> Option<&ItemRecord> {
		self.items.get(&item_id)
	}

	pub fn user(&self, user_id: i64) -> Option<&UserRecord> {
		self.users.get(&user_id)
	}

	pub fn item_count(&self) -> usize {
		self.items.len()
	}

	pub fn user_count(&self) -> usize {
		self.users.len()
	}

	/// Items most similar to `vector`, best first, ties by ascending id.
	pub(crate) fn nearest_items<'a>(
		&'a self,
		vector: &[f32],
		k: usize,
		keep: impl Fn(&ItemRecord) -> bool,
	) -> Vec<(&'a ItemRecord, f64)> {
		let mut scored: Vec<(&ItemRecord, f64)> = self
			.items
			.values()
			.filter(|&item| keep(item))
			.filter_map(|item| Some((item, cosine_similarity(vector, &item.vector)?)))
			.collect();

		scored.sort_by(|left, right| by_score_then_id(left.1, left.0.id, right.1, right.0.id));
		scored.truncate(k);

		scored
	}

	pub(crate) fn item_metadata(item: &ItemRecord) -> Metadata {
		let mut metadata = Metadata::new();

		metadata.insert("feedId".to_string(), item.feed_id.into());

		if let Some(author) = &item.author {
			metadata.insert("author".to_string(), author.clone().into());
		}
		if let Some(category) = &item.category {
			metadata.insert("category".to_string(), category.clone().into());
		}

		metadata
	}
}

pub(crate) fn by_score_then_id(
	left_score: f64,
	left_id: i64,
	right_score: f64,
	right_id: i64,
) -> Ordering {
	cmp_f64_desc(left_score, right_score).then_with(|| left_id.cmp(&right_id))
}

/// Newest first; interactions without a timestamp keep their given order after dated ones.
fn sort_most_recent_first(user: &mut UserRecord) {
	user.interactions.sort_by(|left, right| match (left.timestamp, right.timestamp) {
		(Some(left), Some(right)) => right.cmp(&left),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	});
}
