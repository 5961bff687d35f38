use std::{collections::HashMap, sync::PoisonError};

use rand::seq::SliceRandom;
use serde_json::Value;
use time::OffsetDateTime;

use crate::{ItemRecord, MemoryStore, NEIGHBOR_ITEM_LIMIT, store::by_score_then_id};
use feed_domain::{AttributePreference, Metadata, ScoredId, cosine_similarity};
use feed_recall::{
	AnnIndex, BoxFuture, CoOccurIndex, EmbeddingStore, ItemFreshnessProvider, ItemKind,
	ItemProvider, SequenceStore, UserContext, UserInteraction, UserNeighbor, UserNeighborFinder,
	UserPreferenceService, planner,
};
use feed_retrieval::{DocScore, LexicalIndex, RetrievalContext, SubscriptionStore, VectorSearch};

const FEED_FILTER: &str = "feedId";
const AUTHOR_ATTRIBUTE: &str = "author";

impl SequenceStore for MemoryStore {
	fn recent_interactions<'a>(
		&'a self,
		user_id: i64,
		limit: usize,
	) -> BoxFuture<'a, feed_recall::Result<Vec<UserInteraction>>> {
		Box::pin(async move {
			Ok(self
				.user(user_id)
				.map(|user| user.interactions.iter().take(limit).cloned().collect())
				.unwrap_or_default())
		})
	}
}

impl EmbeddingStore for MemoryStore {
	fn user_vector<'a>(
		&'a self,
		user_id: i64,
	) -> BoxFuture<'a, feed_recall::Result<Option<Vec<f32>>>> {
		Box::pin(async move { Ok(self.user(user_id).and_then(|user| non_empty(&user.vector))) })
	}

	fn item_vector<'a>(
		&'a self,
		item_id: i64,
	) -> BoxFuture<'a, feed_recall::Result<Option<Vec<f32>>>> {
		Box::pin(async move { Ok(self.item(item_id).and_then(|item| non_empty(&item.vector))) })
	}
}

impl AnnIndex for MemoryStore {
	fn query<'a>(
		&'a self,
		vector: &'a [f32],
		k: usize,
		filters: &'a Metadata,
	) -> BoxFuture<'a, feed_recall::Result<Vec<ScoredId>>> {
		Box::pin(async move {
			let feed_id = match filters.get(FEED_FILTER) {
				None | Some(Value::Null) => None,
				Some(_) => Some(planner::filter_int(filters, FEED_FILTER)),
			};
			let in_feed = |item: &ItemRecord| feed_id.is_none_or(|feed_id| item.feed_id == feed_id);
			let hits = self
				.nearest_items(vector, k, in_feed)
				.into_iter()
				.map(|(item, score)| scored_item(item, score))
				.collect();

			Ok(hits)
		})
	}
}

impl CoOccurIndex for MemoryStore {
	fn top_related<'a>(
		&'a self,
		item_id: i64,
		k: usize,
	) -> BoxFuture<'a, feed_recall::Result<Vec<ScoredId>>> {
		Box::pin(async move {
			if let Some(related) = self.co_occurrence.get(&item_id) {
				return Ok(related.iter().take(k).cloned().collect());
			}

			let Some(seed) = self.item(item_id).filter(|item| !item.vector.is_empty()) else {
				return Ok(Vec::new());
			};

			Ok(self
				.nearest_items(&seed.vector, k, |item| item.id != item_id)
				.into_iter()
				.filter(|(_, score)| *score > 0.0)
				.map(|(item, score)| scored_item(item, score))
				.collect())
		})
	}
}

impl UserPreferenceService for MemoryStore {
	/// Authors from the read history, each scored by its summed interaction weight relative to
	/// the heaviest author.
	fn top_attributes<'a>(
		&'a self,
		user_id: i64,
		limit: usize,
	) -> BoxFuture<'a, feed_recall::Result<Vec<AttributePreference>>> {
		Box::pin(async move {
			let Some(user) = self.user(user_id) else { return Ok(Vec::new()) };
			let mut totals: HashMap<&str, f64> = HashMap::new();

			for interaction in &user.interactions {
				let author = self.item(interaction.item_id).and_then(|item| item.author.as_deref());

				if let Some(author) = author {
					*totals.entry(author).or_insert(0.0) += interaction.weight.max(0.0);
				}
			}

			let heaviest = totals.values().copied().fold(0.0_f64, f64::max);
			let mut preferences: Vec<AttributePreference> = totals
				.into_iter()
				.map(|(author, total)| AttributePreference {
					attribute_key: AUTHOR_ATTRIBUTE.to_string(),
					attribute_value: author.to_string(),
					score: if heaviest > 0.0 { total / heaviest } else { 0.0 },
				})
				.collect();

			preferences.sort_by(|left, right| {
				feed_domain::cmp_f64_desc(left.score, right.score)
					.then_with(|| left.attribute_value.cmp(&right.attribute_value))
			});
			preferences.truncate(limit);

			Ok(preferences)
		})
	}
}

impl UserNeighborFinder for MemoryStore {
	fn top_neighbors<'a>(
		&'a self,
		user_id: i64,
		k: usize,
	) -> BoxFuture<'a, feed_recall::Result<Vec<UserNeighbor>>> {
		Box::pin(async move {
			let Some(target) = self.user(user_id).filter(|user| !user.vector.is_empty()) else {
				return Ok(Vec::new());
			};
			let mut neighbors: Vec<UserNeighbor> = self
				.users
				.values()
				.filter(|candidate| candidate.id != user_id && !candidate.interactions.is_empty())
				.filter_map(|candidate| {
					let similarity = cosine_similarity(&target.vector, &candidate.vector)?;

					(similarity > 0.0).then(|| UserNeighbor {
						user_id: candidate.id,
						similarity,
						top_items: candidate
							.interactions
							.iter()
							.take(NEIGHBOR_ITEM_LIMIT)
							.map(|interaction| {
								let score = similarity * interaction.weight.max(1.0);

								ScoredId::new(interaction.item_id, score)
							})
							.collect(),
					})
				})
				.collect();

			neighbors.sort_by(|left, right| {
				by_score_then_id(left.similarity, left.user_id, right.similarity, right.user_id)
			});
			neighbors.truncate(k);

			Ok(neighbors)
		})
	}
}

impl ItemFreshnessProvider for MemoryStore {
	fn published_at<'a>(
		&'a self,
		item_ids: &'a [i64],
	) -> BoxFuture<'a, feed_recall::Result<HashMap<i64, OffsetDateTime>>> {
		Box::pin(async move {
			Ok(item_ids
				.iter()
				.filter_map(|id| Some((*id, self.item(*id)?.published_at?)))
				.collect())
		})
	}
}

impl ItemProvider for MemoryStore {
	fn ls<'a>(
		&'a self,
		context: &'a UserContext,
		kind: ItemKind,
		limit: usize,
	) -> BoxFuture<'a, feed_recall::Result<Vec<ScoredId>>> {
		Box::pin(async move {
			let picked: Vec<i64> = match kind {
				ItemKind::Latest => {
					let mut dated: Vec<(i64, Option<OffsetDateTime>)> =
						self.items.values().map(|item| (item.id, item.published_at)).collect();

					dated.sort_by(|left, right| {
						right.1.cmp(&left.1).then_with(|| right.0.cmp(&left.0))
					});
					dated.into_iter().take(limit).map(|(id, _)| id).collect()
				},
				ItemKind::Random => {
					let ids: Vec<i64> = self.items.keys().copied().collect();
					let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

					ids.choose_multiple(&mut *rng, limit).copied().collect()
				},
			};

			Ok(picked
				.into_iter()
				.filter_map(|id| self.item(id))
				.map(|item| {
					let freshness = item
						.published_at
						.map(|published_at| self.decay.score(published_at, context.request_time))
						.unwrap_or(0.0);

					ScoredId::new(item.id, freshness).with_metadata("title", item.title.as_str())
				})
				.collect())
		})
	}
}

impl SubscriptionStore for MemoryStore {
	fn active_feed_ids<'a>(
		&'a self,
		user_id: i64,
	) -> BoxFuture<'a, feed_retrieval::Result<Vec<i64>>> {
		Box::pin(async move {
			Ok(self.user(user_id).map(|user| user.subscriptions.clone()).unwrap_or_default())
		})
	}
}

impl LexicalIndex for MemoryStore {
	fn search<'a>(
		&'a self,
		context: &'a RetrievalContext,
		k: usize,
	) -> BoxFuture<'a, feed_retrieval::Result<Vec<DocScore>>> {
		Box::pin(async move { Ok(self.lexical.rank(context, k)) })
	}
}

impl VectorSearch for MemoryStore {
	fn search<'a>(
		&'a self,
		embedding: &'a [f32],
		context: &'a RetrievalContext,
		k: usize,
		threshold: f64,
	) -> BoxFuture<'a, feed_retrieval::Result<Vec<DocScore>>> {
		Box::pin(async move { Ok(self.vectors.rank(embedding, context, k, threshold)) })
	}
}

fn scored_item(item: &ItemRecord, score: f64) -> ScoredId {
	ScoredId { id: item.id, score, metadata: MemoryStore::item_metadata(item) }
}

fn non_empty(vector: &[f32]) -> Option<Vec<f32>> {
	(!vector.is_empty()).then(|| vector.to_vec())
}
