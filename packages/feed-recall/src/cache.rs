//! Injected per-user recall result cache.
//!
//! Entries are keyed by channel, user, limit, scene and request filters. A cached list can go
//! stale when the user's vector or history changes; callers that rebuild embeddings should call
//! [`MemoryRecallCache::invalidate_user`].

use std::{collections::HashMap, sync::Arc, time::Duration};

use serde_json::Value;
use tokio::{sync::Mutex, time::Instant};

use crate::{BoxFuture, ItemCandidate, RecallStrategy, Result, StrategyId, UserContext};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecallCacheKey {
	pub strategy: StrategyId,
	pub user_id: i64,
	pub limit: usize,
	pub scene: String,
	/// Filters serialized with keys in sorted order.
	pub filters: String,
}
impl RecallCacheKey {
	pub fn new(strategy: StrategyId, context: &UserContext, limit: usize) -> Self {
		Self {
			strategy,
			user_id: context.user_id,
			limit,
			scene: context.scene.clone(),
			filters: Value::Object(context.filters.clone()).to_string(),
		}
	}
}

pub trait RecallCache
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, key: &'a RecallCacheKey) -> BoxFuture<'a, Option<Vec<ItemCandidate>>>;

	fn put<'a>(&'a self, key: RecallCacheKey, candidates: Vec<ItemCandidate>) -> BoxFuture<'a, ()>;
}

struct CacheEntry {
	candidates: Vec<ItemCandidate>,
	stored_at: Instant,
}

/// Process-local TTL cache. Expired entries are dropped when read and swept on every write.
pub struct MemoryRecallCache {
	ttl: Duration,
	entries: Mutex<HashMap<RecallCacheKey, CacheEntry>>,
}
impl MemoryRecallCache {
	pub fn new(ttl: Duration) -> Self {
		Self { ttl, entries: Mutex::new(HashMap::new()) }
	}

	/// Drops every entry for `user_id` and returns how many were removed.
	pub async fn invalidate_user(&self, user_id: i64) -> usize {
		let mut entries = self.entries.lock().await;
		let before = entries.len();

		entries.retain(|key, _| key.user_id != user_id);

		before - entries.len()
	}

	pub async fn len(&self) -> usize {
		self.entries.lock().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}
}

impl RecallCache for MemoryRecallCache {
	fn get<'a>(&'a self, key: &'a RecallCacheKey) -> BoxFuture<'a, Option<Vec<ItemCandidate>>> {
		Box::pin(async move {
			let mut entries = self.entries.lock().await;
			let entry = entries.get(key)?;

			if entry.stored_at.elapsed() < self.ttl {
				return Some(entry.candidates.clone());
			}

			entries.remove(key);

			None
		})
	}

	fn put<'a>(&'a self, key: RecallCacheKey, candidates: Vec<ItemCandidate>) -> BoxFuture<'a, ()> {
		Box::pin(async move {
			let entry = CacheEntry { candidates, stored_at: Instant::now() };
			let mut entries = self.entries.lock().await;

			entries.retain(|_, stored| stored.stored_at.elapsed() < self.ttl);
			entries.insert(key, entry);
		})
	}
}

/// Serves a channel from the cache and stores only successful results.
pub struct CachedStrategy {
	inner: Arc<dyn RecallStrategy>,
	cache: Arc<dyn RecallCache>,
}
impl CachedStrategy {
	pub fn new(inner: Arc<dyn RecallStrategy>, cache: Arc<dyn RecallCache>) -> Self {
		Self { inner, cache }
	}
}

impl RecallStrategy for CachedStrategy {
	fn id(&self) -> StrategyId {
		self.inner.id()
	}

	fn recall<'a>(
		&'a self,
		context: &'a UserContext,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<ItemCandidate>>> {
		Box::pin(async move {
			let key = RecallCacheKey::new(self.id(), context, limit);

			if let Some(cached) = self.cache.get(&key).await {
				tracing::debug!(
					strategy = %key.strategy,
					user_id = key.user_id,
					size = cached.len(),
					"Recall cache hit."
				);

				return Ok(cached);
			}

			let candidates = self.inner.recall(context, limit).await?;

			self.cache.put(key, candidates.clone()).await;

			Ok(candidates)
		})
	}
}
