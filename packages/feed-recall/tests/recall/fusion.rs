use std::{
	collections::{HashMap, HashSet},
	sync::Arc,
};

use time::Duration;

use super::{FakeFreshness, NOW, close, ids};
use feed_recall::{
	ChannelResults, DiversityConfig, FreshnessSettings, FusionConfig, FusionContext, FusionEngine,
	ItemCandidate, RecallRequest, StrategyId, fusion,
};

fn request() -> RecallRequest {
	RecallRequest::new(1, "home", 10).with_request_time(NOW)
}

fn channel(id: StrategyId, scored: &[(i64, f64)]) -> Vec<ItemCandidate> {
	scored.iter().map(|(item_id, score)| ItemCandidate::new(*item_id, *score, id)).collect()
}

fn plain_engine() -> FusionEngine {
	FusionEngine::new(FreshnessSettings::default())
}

#[tokio::test]
async fn duplicate_keeps_highest_weighted_copy() {
	let mut results = ChannelResults::new();

	results.insert(StrategyId::I2i, channel(StrategyId::I2i, &[(42, 0.8)]));
	results.insert(StrategyId::U2i, channel(StrategyId::U2i, &[(42, 0.6)]));

	let mut config = FusionConfig::new(5);

	config.weights.insert(StrategyId::I2i, 0.5);

	let request = request();
	let outcome = plain_engine()
		.fuse_with_sources(&results, &FusionContext { request: &request, config: &config })
		.await;

	assert_eq!(outcome.candidates.len(), 1);
	assert!(close(outcome.candidates[0].score, 0.6));
	assert_eq!(outcome.candidates[0].source, StrategyId::U2i);
	assert_eq!(outcome.contributing_sources[&42], vec![StrategyId::I2i, StrategyId::U2i]);
}

#[tokio::test]
async fn fused_output_never_repeats_an_item() {
	let mut results = ChannelResults::new();

	results.insert(StrategyId::I2i, channel(StrategyId::I2i, &[(1, 0.9), (2, 0.5), (3, 0.4)]));
	results.insert(StrategyId::U2i, channel(StrategyId::U2i, &[(2, 0.7), (3, 0.8), (4, 0.1)]));
	results.insert(StrategyId::Latest, channel(StrategyId::Latest, &[(1, 0.2), (4, 0.6)]));

	let request = request();

	for interleave in [true, false] {
		let config = FusionConfig { interleave_channels: interleave, ..FusionConfig::new(10) };
		let context = FusionContext { request: &request, config: &config };
		let fused = plain_engine().fuse(&results, &context).await;
		let unique: HashSet<i64> = ids(&fused).into_iter().collect();

		assert_eq!(unique.len(), fused.len());
		assert_eq!(fused.len(), 4);
	}
}

#[tokio::test]
async fn diversity_caps_each_bucket() {
	let authors = ["ada", "ada", "bob", "ada", "bob", "bob", "cy"];
	let candidates: Vec<ItemCandidate> = authors
		.iter()
		.enumerate()
		.map(|(index, author)| {
			ItemCandidate::new(index as i64, 1.0 - index as f64 * 0.1, StrategyId::U2i)
				.with_attribute("author", *author)
		})
		.collect();
	let mut results = ChannelResults::new();

	results.insert(StrategyId::U2i, candidates);

	let config = FusionConfig {
		diversity: DiversityConfig::by_attribute("author", 2),
		..FusionConfig::new(10)
	};
	let request = request();
	let fused =
		plain_engine().fuse(&results, &FusionContext { request: &request, config: &config }).await;
	let mut per_author: HashMap<String, usize> = HashMap::new();

	for candidate in &fused {
		let author = candidate.attributes["author"].as_str().unwrap_or_default().to_string();

		*per_author.entry(author).or_default() += 1;
	}

	assert!(per_author.values().all(|count| *count <= 2));
	assert_eq!(ids(&fused), vec![0, 1, 2, 4, 6]);
}

#[tokio::test]
async fn diversity_stops_at_top_k_and_backfills_overflow() {
	let mut results = ChannelResults::new();

	results.insert(
		StrategyId::U2i,
		vec![
			ItemCandidate::new(1, 0.9, StrategyId::U2i).with_attribute("feedId", 3),
			ItemCandidate::new(2, 0.8, StrategyId::U2i).with_attribute("feedId", 3),
			ItemCandidate::new(3, 0.7, StrategyId::U2i).with_attribute("feedId", 3),
		],
	);

	let config = FusionConfig {
		diversity: DiversityConfig::by_attribute("feedId", 1).with_fill_overflow(true),
		..FusionConfig::new(2)
	};
	let request = request();
	let fused =
		plain_engine().fuse(&results, &FusionContext { request: &request, config: &config }).await;

	assert_eq!(ids(&fused), vec![1, 2]);
}

#[tokio::test]
async fn one_half_life_blends_to_known_score() {
	let published = HashMap::from([(7, NOW - Duration::hours(48))]);
	let engine = FusionEngine::new(FreshnessSettings {
		weight: 0.3,
		half_life_hours: 48.0,
		default_freshness: 0.0,
	})
	.with_freshness_provider(Arc::new(FakeFreshness { published, fail: false }));
	let mut results = ChannelResults::new();

	results.insert(StrategyId::U2i, channel(StrategyId::U2i, &[(7, 0.8), (8, 0.8)]));

	let config = FusionConfig::new(5);
	let request = request();
	let fused = engine.fuse(&results, &FusionContext { request: &request, config: &config }).await;

	assert_eq!(ids(&fused), vec![7, 8]);
	assert!(close(fused[0].score, 0.71));
	assert!(close(fused[1].score, 0.56));
}

#[tokio::test]
async fn freshness_lookup_failure_uses_default() {
	let engine = FusionEngine::new(FreshnessSettings {
		weight: 0.5,
		half_life_hours: 24.0,
		default_freshness: 0.4,
	})
	.with_freshness_provider(Arc::new(FakeFreshness { published: HashMap::new(), fail: true }));
	let mut results = ChannelResults::new();

	results.insert(StrategyId::Latest, channel(StrategyId::Latest, &[(1, 1.0)]));

	let config = FusionConfig::new(5);
	let request = request();
	let fused = engine.fuse(&results, &FusionContext { request: &request, config: &config }).await;

	assert!(close(fused[0].score, 0.7));
}

#[test]
fn interleave_alternates_channels_in_rank_order() {
	let sorted = vec![
		ItemCandidate::new(1, 0.9, StrategyId::I2i),
		ItemCandidate::new(2, 0.8, StrategyId::I2i),
		ItemCandidate::new(11, 0.7, StrategyId::U2i),
		ItemCandidate::new(3, 0.6, StrategyId::I2i),
		ItemCandidate::new(12, 0.5, StrategyId::U2i),
	];

	assert_eq!(ids(&fusion::interleave(sorted.clone(), 5)), vec![1, 11, 2, 12, 3]);
	assert_eq!(ids(&fusion::interleave(sorted, 3)), vec![1, 11, 2]);
}

#[tokio::test]
async fn disabled_interleave_keeps_score_order_and_truncates() {
	let mut results = ChannelResults::new();

	results.insert(StrategyId::I2i, channel(StrategyId::I2i, &[(1, 0.9), (2, 0.8), (3, 0.6)]));
	results.insert(StrategyId::U2i, channel(StrategyId::U2i, &[(11, 0.7), (12, 0.5)]));

	let request = request();
	let config = FusionConfig { interleave_channels: false, ..FusionConfig::new(4) };
	let fused =
		plain_engine().fuse(&results, &FusionContext { request: &request, config: &config }).await;

	assert_eq!(ids(&fused), vec![1, 2, 11, 3]);

	let config = FusionConfig::new(4);
	let fused =
		plain_engine().fuse(&results, &FusionContext { request: &request, config: &config }).await;

	assert_eq!(ids(&fused), vec![1, 11, 2, 12]);
}
