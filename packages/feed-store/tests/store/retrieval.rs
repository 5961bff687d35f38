use std::sync::Arc;

use super::{NOW, store};
use feed_retrieval::{
	HybridPipeline, LexicalHandler, LexicalIndex, RetrievalContext, SearchRequest, SearchService,
	SubscriptionStore, VectorSearch,
};

fn sorted(mut ids: Vec<i64>) -> Vec<i64> {
	ids.sort_unstable();

	ids
}

#[tokio::test]
async fn subscriptions_come_from_the_user_record() {
	let store = store();

	assert_eq!(store.active_feed_ids(1).await.ok(), Some(vec![10]));
	assert_eq!(store.active_feed_ids(404).await.ok(), Some(Vec::new()));
}

#[tokio::test]
async fn lexical_search_covers_titles_and_bodies() {
	let store = store();
	let global = RetrievalContext::global(10).with_query("rust");
	let hits = LexicalIndex::search(store.as_ref(), &global, 10).await.expect("Search failed.");

	assert_eq!(sorted(hits.iter().map(|hit| hit.doc_id).collect()), vec![1, 2, 5]);

	let scoped = RetrievalContext::scoped(1, vec![10], 10).with_query("rust");
	let hits = LexicalIndex::search(store.as_ref(), &scoped, 10).await.expect("Search failed.");

	assert_eq!(sorted(hits.iter().map(|hit| hit.doc_id).collect()), vec![1, 2]);
}

#[tokio::test]
async fn vector_search_applies_threshold() {
	let store = store();
	let context = RetrievalContext::global(10);
	let hits = VectorSearch::search(store.as_ref(), &[0.0, 1.0, 0.0], &context, 10, 0.05)
		.await
		.expect("Search failed.");

	assert_eq!(hits.iter().map(|hit| hit.doc_id).collect::<Vec<_>>(), vec![3, 2]);
}

#[tokio::test]
async fn search_service_runs_over_the_store() {
	let store = store();
	let pipeline = HybridPipeline::new(0.0, 48.0)
		.with_handler(Arc::new(LexicalHandler::new(store.clone(), 50)), 1.0);
	let service = SearchService::new(pipeline, store, 10);
	let scoped = service
		.search_at(&SearchRequest::new(1, "rust", 5), NOW)
		.await
		.expect("Search failed.");

	assert_eq!(sorted(scoped), vec![1, 2]);

	let global = service
		.search_at(&SearchRequest::new(2, "rust", 5).global(), NOW)
		.await
		.expect("Search failed.");

	assert_eq!(sorted(global), vec![1, 2, 5]);
}
