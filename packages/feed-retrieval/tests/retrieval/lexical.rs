use std::sync::Arc;

use super::{NOW, doc_ids, document};
use feed_retrieval::{
	LexicalDocument, LexicalHandler, MemoryLexicalIndex, MemoryVectorIndex, RetrievalContext,
	RetrievalHandler, VectorDocument, VectorHandler,
};

fn catalog() -> MemoryLexicalIndex {
	MemoryLexicalIndex::new([
		document(1, 10, "Rust async runtime"),
		LexicalDocument {
			body: Some("rust async and more".to_string()),
			..document(2, 10, "Weekly notes")
		},
		LexicalDocument {
			tags: vec!["rust".to_string(), "tokio".to_string()],
			..document(3, 20, "Scheduler deep dive")
		},
	])
}

fn query(text: &str) -> RetrievalContext {
	RetrievalContext::global(10).with_query(text).with_request_time(NOW)
}

#[test]
fn title_matches_outrank_body_matches() {
	let hits = catalog().rank(&query("Rust ASYNC"), 10);

	assert_eq!(doc_ids(&hits), vec![1, 2]);
	assert!(hits[0].score > hits[1].score);
	assert_eq!(hits[0].title.as_deref(), Some("Rust async runtime"));
}

#[test]
fn every_term_must_match() {
	assert_eq!(doc_ids(&catalog().rank(&query("rust tokio"), 10)), vec![3]);
	assert!(catalog().rank(&query("rust haskell"), 10).is_empty());
}

#[test]
fn scoped_queries_only_see_subscribed_feeds() {
	let scoped = RetrievalContext::scoped(1, vec![20], 10).with_query("rust");

	assert_eq!(doc_ids(&catalog().rank(&scoped, 10)), vec![3]);
}

#[tokio::test]
async fn lexical_handler_needs_text() {
	let handler = LexicalHandler::new(Arc::new(catalog()), 1);

	assert!(!handler.supports(&RetrievalContext::global(5).with_query("  ")));
	assert!(handler.supports(&query("rust")));

	let hits = handler.handle(&query("rust")).await.expect("Lexical search failed.");

	assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn vector_handler_applies_similarity_threshold() {
	let vectors = MemoryVectorIndex::new([
		VectorDocument { doc_id: 1, vector: vec![1.0, 0.0], ..Default::default() },
		VectorDocument { doc_id: 2, vector: vec![0.0, 1.0], ..Default::default() },
		VectorDocument { doc_id: 3, vector: vec![1.0, 1.0], ..Default::default() },
	]);
	let handler = VectorHandler::new(Arc::new(vectors), 10, 0.5);
	let context = RetrievalContext::global(10).with_embedding(vec![1.0, 0.0]);

	assert!(!handler.supports(&query("rust")));
	assert!(handler.supports(&context));

	let hits = handler.handle(&context).await.expect("Vector search failed.");

	assert_eq!(doc_ids(&hits), vec![1, 3]);
}
