use std::{
	collections::HashMap,
	sync::{Arc, atomic::Ordering},
	time::Duration,
};

use serde_json::json;

use super::{FailingStrategy, FakeEmbeddings, StaticStrategy, context, ids};
use feed_domain::{Metadata, ScoredId};
use feed_recall::{
	AnnIndex, BoxFuture, CachedStrategy, MemoryRecallCache, RecallCache, RecallCacheKey,
	RecallStrategy, Result, StrategyId, UserContext, planner, strategies::U2iStrategy,
};

/// Answers every query with a single item derived from the `feedId` filter.
struct FeedScopedAnn;

impl AnnIndex for FeedScopedAnn {
	fn query<'a>(
		&'a self,
		_vector: &'a [f32],
		_k: usize,
		filters: &'a Metadata,
	) -> BoxFuture<'a, Result<Vec<ScoredId>>> {
		let feed_id = planner::filter_int(filters, "feedId");

		Box::pin(async move { Ok(vec![ScoredId::new(100 + feed_id, 0.9)]) })
	}
}

fn feed_context(user_id: i64, feed_id: i64) -> UserContext {
	let mut context = context(user_id, Vec::new());

	context.filters.insert("feedId".to_string(), json!(feed_id));

	context
}

#[tokio::test]
async fn hit_skips_inner_strategy() {
	let inner = StaticStrategy::new(StrategyId::U2i, &[(1, 0.9), (2, 0.8)]);
	let calls = Arc::clone(&inner.calls);
	let cache = Arc::new(MemoryRecallCache::new(Duration::from_secs(60)));
	let cached = CachedStrategy::new(Arc::new(inner), cache.clone());
	let context = context(4, Vec::new());
	let first = cached.recall(&context, 2).await.expect("First recall failed.");
	let second = cached.recall(&context, 2).await.expect("Second recall failed.");

	assert_eq!(ids(&first), ids(&second));
	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert_eq!(cached.id(), StrategyId::U2i);
	assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn limit_is_part_of_the_key() {
	let inner = StaticStrategy::new(StrategyId::U2i, &[(1, 0.9), (2, 0.8)]);
	let calls = Arc::clone(&inner.calls);
	let cached = CachedStrategy::new(
		Arc::new(inner),
		Arc::new(MemoryRecallCache::new(Duration::from_secs(60))),
	);
	let context = context(4, Vec::new());

	assert_eq!(ids(&cached.recall(&context, 1).await.expect("Recall failed.")), vec![1]);
	assert_eq!(ids(&cached.recall(&context, 2).await.expect("Recall failed.")), vec![1, 2]);
	assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn filters_and_scene_are_part_of_the_key() {
	let embeddings = FakeEmbeddings { users: HashMap::from([(4, vec![1.0, 0.0])]) };
	let inner = U2iStrategy::new(Arc::new(embeddings), Arc::new(FeedScopedAnn));
	let cache = Arc::new(MemoryRecallCache::new(Duration::from_secs(60)));
	let cached = CachedStrategy::new(Arc::new(inner), cache.clone());
	let first_feed = cached.recall(&feed_context(4, 1), 5).await.expect("Recall failed.");
	let second_feed = cached.recall(&feed_context(4, 2), 5).await.expect("Recall failed.");

	assert_eq!(ids(&first_feed), vec![101]);
	assert_eq!(ids(&second_feed), vec![102]);

	let mut other_scene = feed_context(4, 1);

	other_scene.scene = "discover".to_string();

	assert_eq!(ids(&cached.recall(&other_scene, 5).await.expect("Recall failed.")), vec![101]);
	assert_eq!(cache.len().await, 3);
}

#[tokio::test]
async fn failures_are_not_cached() {
	let cache = Arc::new(MemoryRecallCache::new(Duration::from_secs(60)));
	let cached = CachedStrategy::new(Arc::new(FailingStrategy(StrategyId::U2i2i)), cache.clone());

	assert!(cached.recall(&context(4, Vec::new()), 3).await.is_err());
	assert!(cache.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn entries_expire_after_ttl() {
	let cache = MemoryRecallCache::new(Duration::from_secs(30));
	let key = RecallCacheKey::new(StrategyId::U2i, &context(1, Vec::new()), 5);

	cache.put(key.clone(), Vec::new()).await;

	assert!(cache.get(&key).await.is_some());

	tokio::time::advance(Duration::from_secs(31)).await;

	assert!(cache.get(&key).await.is_none());
	assert!(cache.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn writes_sweep_expired_entries() {
	let cache = MemoryRecallCache::new(Duration::from_secs(1));

	for user_id in 0..1_000 {
		let key = RecallCacheKey::new(StrategyId::U2i, &context(user_id, Vec::new()), 5);

		cache.put(key, Vec::new()).await;
	}

	assert_eq!(cache.len().await, 1_000);

	tokio::time::advance(Duration::from_secs(3_600)).await;

	let fresh = RecallCacheKey::new(StrategyId::U2i, &context(5_000, Vec::new()), 5);

	cache.put(fresh.clone(), Vec::new()).await;

	assert_eq!(cache.len().await, 1);
	assert!(cache.get(&fresh).await.is_some());
}

#[tokio::test]
async fn invalidate_user_drops_only_that_user() {
	let cache = MemoryRecallCache::new(Duration::from_secs(60));

	for (strategy, user_id) in
		[(StrategyId::U2i, 1), (StrategyId::U2i2i, 1), (StrategyId::U2i, 2)]
	{
		let key = RecallCacheKey::new(strategy, &context(user_id, Vec::new()), 10);

		cache.put(key, Vec::new()).await;
	}

	assert_eq!(cache.invalidate_user(1).await, 2);
	assert_eq!(cache.len().await, 1);
	assert_eq!(cache.invalidate_user(1).await, 0);
}
