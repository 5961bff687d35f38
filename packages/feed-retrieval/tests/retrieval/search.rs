use std::sync::Arc;

use super::{FixedEmbedder, FixedSubscriptions, NOW, document};
use feed_retrieval::{
	HybridPipeline, LexicalHandler, MemoryLexicalIndex, MemoryVectorIndex, SearchRequest,
	SearchService, VectorDocument, VectorHandler,
};

fn pipeline() -> HybridPipeline {
	let lexical = MemoryLexicalIndex::new([
		document(1, 10, "Rust weekly"),
		document(2, 10, "Rust release notes"),
		document(3, 20, "Rust in production"),
	]);
	let vectors = MemoryVectorIndex::new([VectorDocument {
		doc_id: 9,
		feed_id: Some(10),
		vector: vec![1.0, 0.0],
		..Default::default()
	}]);

	HybridPipeline::new(0.0, 48.0)
		.with_handler(Arc::new(LexicalHandler::new(Arc::new(lexical), 100)), 0.4)
		.with_handler(Arc::new(VectorHandler::new(Arc::new(vectors), 100, 0.3)), 0.6)
}

fn service(feed_ids: Vec<i64>, fusion_top_k: usize) -> SearchService {
	SearchService::new(
		pipeline(),
		Arc::new(FixedSubscriptions { feed_ids, fail: false }),
		fusion_top_k,
	)
}

#[tokio::test]
async fn blank_query_is_empty() {
	let ids = service(vec![10], 10).search_at(&SearchRequest::new(1, "   ", 5), NOW).await;

	assert_eq!(ids.ok(), Some(Vec::new()));
}

#[tokio::test]
async fn no_subscriptions_means_no_scoped_results() {
	let ids = service(Vec::new(), 10).search_at(&SearchRequest::new(1, "rust", 5), NOW).await;

	assert_eq!(ids.ok(), Some(Vec::new()));
}

#[tokio::test]
async fn scoped_search_only_returns_subscribed_feeds() {
	let ids = service(vec![20], 10)
		.search_at(&SearchRequest::new(1, "rust", 5), NOW)
		.await
		.expect("Search failed.");

	assert_eq!(ids, vec![3]);
}

#[tokio::test]
async fn global_search_ignores_subscriptions() {
	let request = SearchRequest::new(1, "rust", 5).global();
	let ids = service(Vec::new(), 10).search_at(&request, NOW).await.expect("Search failed.");

	assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn non_positive_size_falls_back_to_fusion_top_k() {
	let service = service(Vec::new(), 2);

	for (top_k, expected) in [(0, 2), (-4, 2), (1, 1), (5, 3)] {
		let request = SearchRequest::new(1, "rust", top_k).global();
		let ids = service.search_at(&request, NOW).await.expect("Search failed.");

		assert_eq!(ids.len(), expected, "top_k={top_k}");
	}
}

#[tokio::test]
async fn embedder_fills_in_missing_vector() {
	let embedder = Arc::new(FixedEmbedder(Some(vec![1.0, 0.0])));
	let service = service(vec![10], 10).with_embedder(embedder);
	let request = SearchRequest::new(1, "kotlin", 5);

	assert_eq!(service.search_at(&request, NOW).await.ok(), Some(vec![9]));

	let explicit = SearchRequest::new(1, "kotlin", 5).with_embedding(vec![0.0, 1.0]);

	assert_eq!(service.search_at(&explicit, NOW).await.ok(), Some(Vec::new()));
}

#[tokio::test]
async fn subscription_failure_is_reported() {
	let service = SearchService::new(
		pipeline(),
		Arc::new(FixedSubscriptions { feed_ids: Vec::new(), fail: true }),
		10,
	);

	assert!(service.search_at(&SearchRequest::new(1, "rust", 5), NOW).await.is_err());
}
