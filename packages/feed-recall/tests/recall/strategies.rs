use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
};

use super::{
	FakeAnn, FakeCoOccur, FakeEmbeddings, FakeInverted, FakeItems, FakeNeighbors, FakePreferences,
	FixedSequence, close, context, ids,
};
use feed_domain::{AttributePreference, ScoredId};
use feed_recall::{
	RecallStrategy, StrategyId, UserInteraction, UserNeighbor,
	strategies::{
		I2iStrategy, LatestStrategy, RandomI2iStrategy, U2a2iStrategy, U2iStrategy, U2i2iStrategy,
		U2uStrategy,
	},
};

fn embeddings_for(user_id: i64) -> Arc<FakeEmbeddings> {
	Arc::new(FakeEmbeddings { users: HashMap::from([(user_id, vec![0.1, 0.2, 0.3])]) })
}

fn co_occur(related: &[(i64, &[(i64, f64)])]) -> Arc<FakeCoOccur> {
	let related: HashMap<i64, Vec<ScoredId>> = related
		.iter()
		.map(|(seed, hits)| {
			(*seed, hits.iter().map(|(id, score)| ScoredId::new(*id, *score)).collect())
		})
		.collect();

	Arc::new(FakeCoOccur { related })
}

fn preference(key: &str, value: &str, score: f64) -> AttributePreference {
	AttributePreference {
		attribute_key: key.to_string(),
		attribute_value: value.to_string(),
		score,
	}
}

#[tokio::test]
async fn u2i_without_user_vector_is_empty() {
	let ann = Arc::new(FakeAnn { hits: vec![ScoredId::new(1, 0.9)], ..Default::default() });
	let strategy = U2iStrategy::new(Arc::new(FakeEmbeddings::default()), ann.clone());
	let candidates = strategy.recall(&context(3, Vec::new()), 5).await.expect("U2I failed.");

	assert!(candidates.is_empty());
	assert!(ann.requested.lock().map(|requested| requested.is_empty()).unwrap_or(false));
}

#[tokio::test]
async fn u2i_passes_hits_through_with_metadata() {
	let hits = vec![
		ScoredId::new(4, 0.9).with_metadata("author", "ada"),
		ScoredId::new(5, 0.7),
		ScoredId::new(6, 0.1),
	];
	let ann = Arc::new(FakeAnn { hits, requested: Mutex::new(Vec::new()) });
	let strategy = U2iStrategy::new(embeddings_for(3), ann.clone());
	let candidates = strategy.recall(&context(3, Vec::new()), 2).await.expect("U2I failed.");

	assert_eq!(ids(&candidates), vec![4, 5]);
	assert_eq!(candidates[0].source, StrategyId::U2i);
	assert_eq!(candidates[0].attributes["author"], "ada");
	assert_eq!(ann.requested.lock().map(|requested| requested.clone()).ok(), Some(vec![2]));
}

#[tokio::test]
async fn u2i2i_weights_neighbors_by_seed_score() {
	let ann = Arc::new(FakeAnn {
		hits: vec![ScoredId::new(1, 1.0), ScoredId::new(2, 0.5)],
		..Default::default()
	});
	let related = co_occur(&[
		(1, &[(20, 0.4), (1, 0.9), (30, 0.4)]),
		(2, &[(20, 0.3), (99, 0.9)]),
	]);
	let strategy = U2i2iStrategy::new(embeddings_for(3), ann, related, 2, 10);
	let history = vec![UserInteraction::new(99, 1.0)];
	let candidates = strategy.recall(&context(3, history), 10).await.expect("U2I2I failed.");

	assert_eq!(ids(&candidates), vec![20, 30]);
	assert!(close(candidates[0].score, 0.55));
	assert!(close(candidates[1].score, 0.4));
	assert!(candidates.iter().all(|candidate| candidate.source == StrategyId::U2i2i));
}

#[tokio::test]
async fn i2i_decays_older_seeds() {
	let related = co_occur(&[(1, &[(5, 0.5), (2, 0.9)]), (2, &[(5, 0.5), (6, 1.0)])]);
	let strategy = I2iStrategy::new(related, 2, 5);
	let history = vec![UserInteraction::new(1, 2.0), UserInteraction::new(2, 0.5)];
	let candidates = strategy.recall(&context(8, history), 10).await.expect("I2I failed.");
	let decay = (-0.5_f64).exp();

	assert_eq!(ids(&candidates), vec![5, 6]);
	assert!(close(candidates[0].score, 1.0 + 0.5 * decay));
	assert!(close(candidates[1].score, decay));
}

#[tokio::test]
async fn i2i_falls_back_to_sequence_store() {
	let related = co_occur(&[(1, &[(5, 0.5), (1, 0.8)])]);
	let sequence = Arc::new(FixedSequence {
		interactions: vec![UserInteraction::new(1, 1.0)],
		fail: false,
	});
	let strategy = I2iStrategy::new(related, 3, 5).with_sequence_store(sequence);
	let candidates = strategy.recall(&context(8, Vec::new()), 10).await.expect("I2I failed.");

	assert_eq!(ids(&candidates), vec![5]);
	assert!(close(candidates[0].score, 0.5));
}

#[tokio::test]
async fn i2i_without_history_is_empty() {
	let strategy = I2iStrategy::new(co_occur(&[(1, &[(5, 0.5)])]), 3, 5);
	let candidates = strategy.recall(&context(8, Vec::new()), 10).await.expect("I2I failed.");

	assert!(candidates.is_empty());
}

#[tokio::test]
async fn u2a2i_queries_top_preferences() {
	let preferences = Arc::new(FakePreferences(vec![
		preference("category", "rust", 0.9),
		preference("author", "ada", 0.6),
		preference("tags", "async", 0.2),
	]));
	let inverted = Arc::new(FakeInverted {
		hits: vec![ScoredId::new(40, 0.8).with_metadata("category", "rust")],
		..Default::default()
	});
	let strategy = U2a2iStrategy::new(preferences, inverted.clone(), 2);
	let candidates = strategy.recall(&context(2, Vec::new()), 4).await.expect("U2A2I failed.");

	assert_eq!(ids(&candidates), vec![40]);
	assert_eq!(candidates[0].attributes["category"], "rust");

	let queries = inverted.queries.lock().map(|queries| queries.clone()).unwrap_or_default();

	assert_eq!(queries.len(), 1);
	assert_eq!(queries[0].len(), 2);
	assert_eq!(queries[0][0].attribute_value, "rust");
}

#[tokio::test]
async fn u2a2i_without_preferences_skips_the_index() {
	let hits = vec![ScoredId::new(1, 1.0)];
	let inverted = Arc::new(FakeInverted { hits, ..Default::default() });
	let strategy = U2a2iStrategy::new(Arc::new(FakePreferences::default()), inverted.clone(), 5);
	let candidates = strategy.recall(&context(2, Vec::new()), 4).await.expect("U2A2I failed.");

	assert!(candidates.is_empty());
	assert!(inverted.queries.lock().map(|queries| queries.is_empty()).unwrap_or(false));
}

#[tokio::test]
async fn u2u_sums_similarity_weighted_items() {
	let neighbors = Arc::new(FakeNeighbors(vec![
		UserNeighbor {
			user_id: 10,
			similarity: 1.0,
			top_items: vec![ScoredId::new(7, 0.5), ScoredId::new(8, 0.9)],
		},
		UserNeighbor {
			user_id: 11,
			similarity: 0.5,
			top_items: vec![ScoredId::new(7, 0.4), ScoredId::new(9, 0.5)],
		},
	]));
	let strategy = U2uStrategy::new(neighbors, 5);
	let history = vec![UserInteraction::new(8, 1.0)];
	let candidates = strategy.recall(&context(1, history), 10).await.expect("U2U failed.");

	assert_eq!(ids(&candidates), vec![7, 9]);
	assert!(close(candidates[0].score, 0.7));
	assert!(close(candidates[1].score, 0.25));
}

#[tokio::test]
async fn latest_returns_provider_order() {
	let items = Arc::new(FakeItems {
		latest: vec![ScoredId::new(1, 0.9), ScoredId::new(2, 0.8), ScoredId::new(3, 0.7)],
		..Default::default()
	});
	let strategy = LatestStrategy::new(items);
	let candidates = strategy.recall(&context(1, Vec::new()), 2).await.expect("Latest failed.");

	assert_eq!(ids(&candidates), vec![1, 2]);
	assert!(candidates.iter().all(|candidate| candidate.source == StrategyId::Latest));
}

#[tokio::test]
async fn random_i2i_expands_one_drawn_item() {
	let items = Arc::new(FakeItems {
		random: vec![ScoredId::new(100, 1.0), ScoredId::new(200, 1.0)],
		..Default::default()
	});
	let related = co_occur(&[(100, &[(101, 0.6)]), (200, &[(201, 0.4)])]);
	let first = RandomI2iStrategy::new(items.clone(), related.clone()).with_seed(7);
	let second = RandomI2iStrategy::new(items, related).with_seed(7);
	let context = context(1, Vec::new());
	let drawn = ids(&first.recall(&context, 5).await.expect("Random I2I failed."));

	assert!(drawn == vec![101] || drawn == vec![201]);
	assert_eq!(ids(&second.recall(&context, 5).await.expect("Random I2I failed.")), drawn);
}

#[tokio::test]
async fn random_i2i_with_empty_pool_is_empty() {
	let related = co_occur(&[(100, &[(101, 0.6)])]);
	let strategy = RandomI2iStrategy::new(Arc::new(FakeItems::default()), related);
	let candidates =
		strategy.recall(&context(1, Vec::new()), 5).await.expect("Random I2I failed.");

	assert!(candidates.is_empty());
}
