use std::sync::{Arc, atomic::Ordering};

use time::Duration;

use super::{FailingHandler, NOW, StaticHandler, close, doc_ids};
use feed_retrieval::{DocScore, HybridPipeline, RetrievalContext};

fn context(top_k: usize) -> RetrievalContext {
	RetrievalContext::global(top_k).with_query("rust").with_request_time(NOW)
}

#[tokio::test]
async fn normalized_channels_sum_per_document() {
	let pipeline = HybridPipeline::new(0.0, 48.0)
		.with_handler(Arc::new(StaticHandler::new(&[(1, 10.0), (2, 5.0), (3, 0.0)])), 0.4)
		.with_handler(Arc::new(StaticHandler::new(&[(2, 0.9), (4, 0.5)])), 0.6);
	let fused = pipeline.execute(&context(10)).await;

	assert_eq!(doc_ids(&fused), vec![2, 1, 3, 4]);
	assert!(close(fused[0].score, 0.8));
	assert!(close(fused[1].score, 0.4));
	assert!(close(fused[2].score, 0.0));
}

#[tokio::test]
async fn failing_handler_is_skipped() {
	let pipeline = HybridPipeline::new(0.0, 48.0)
		.with_handler(Arc::new(FailingHandler), 0.5)
		.with_handler(Arc::new(StaticHandler::new(&[(7, 0.3), (8, 0.1)])), 0.5);
	let fused = pipeline.execute(&context(10)).await;

	assert_eq!(doc_ids(&fused), vec![7, 8]);
	assert!(close(fused[0].score, 0.5));
}

#[tokio::test]
async fn unsupported_handler_is_not_invoked() {
	let idle = StaticHandler { applicable: false, ..StaticHandler::new(&[(1, 1.0)]) };
	let calls = Arc::clone(&idle.calls);
	let pipeline = HybridPipeline::new(0.0, 48.0).with_handler(Arc::new(idle), 1.0);

	assert!(pipeline.execute(&context(10)).await.is_empty());
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn freshness_blend_treats_unknown_publish_time_as_stale() {
	let hits = vec![
		DocScore::new(1, 0.6).with_published_at(Some(NOW - Duration::hours(48))),
		DocScore::new(2, 0.6),
	];
	let pipeline =
		HybridPipeline::new(0.3, 48.0).with_handler(Arc::new(StaticHandler::with_hits(hits)), 1.0);
	let fused = pipeline.execute(&context(10)).await;

	assert_eq!(doc_ids(&fused), vec![1, 2]);
	assert!(close(fused[0].score, 0.85));
	assert!(close(fused[1].score, 0.7));
}

#[tokio::test]
async fn duplicate_titles_keep_the_best_document() {
	let hits = vec![
		DocScore::new(1, 0.9).with_title(Some("Rust News".to_string())),
		DocScore::new(2, 0.5).with_title(Some("  rust news ".to_string())),
		DocScore::new(3, 0.1).with_title(Some("Other".to_string())),
		DocScore::new(4, 0.1),
	];
	let pipeline =
		HybridPipeline::new(0.0, 48.0).with_handler(Arc::new(StaticHandler::with_hits(hits)), 1.0);
	let fused = pipeline.execute(&context(10)).await;

	assert_eq!(doc_ids(&fused), vec![1, 3, 4]);
}

#[tokio::test]
async fn output_is_truncated_to_top_k() {
	let pipeline = HybridPipeline::new(0.0, 48.0)
		.with_handler(Arc::new(StaticHandler::new(&[(1, 0.9), (2, 0.8), (3, 0.7)])), 1.0);

	assert_eq!(doc_ids(&pipeline.execute(&context(2)).await), vec![1, 2]);
}
