//! Weighted-field lexical channel.
//!
//! A document matches only when every query term occurs in at least one field. Its score is
//! `Σ_terms Σ_fields weight × tf`, damped by `1 + ln(1 + term_count)` so long bodies do not
//! dominate.

use std::{collections::HashMap, sync::Arc};

use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

use crate::{BoxFuture, DocScore, Result, RetrievalContext, pipeline::RetrievalHandler};

pub const TITLE_WEIGHT: f64 = 1.0;
pub const CATEGORY_WEIGHT: f64 = 1.0;
pub const TAGS_WEIGHT: f64 = 0.4;
pub const SUMMARY_WEIGHT: f64 = 0.4;
pub const AUTHOR_WEIGHT: f64 = 0.4;
pub const BODY_WEIGHT: f64 = 0.2;

pub trait LexicalIndex
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		context: &'a RetrievalContext,
		k: usize,
	) -> BoxFuture<'a, Result<Vec<DocScore>>>;
}

#[derive(Clone, Debug, Default)]
pub struct LexicalDocument {
	pub doc_id: i64,
	pub feed_id: Option<i64>,
	pub title: String,
	pub category: Option<String>,
	pub tags: Vec<String>,
	pub summary: Option<String>,
	pub author: Option<String>,
	pub body: Option<String>,
	pub published_at: Option<OffsetDateTime>,
}

#[derive(Debug)]
struct IndexedDocument {
	doc_id: i64,
	feed_id: Option<i64>,
	title: String,
	published_at: Option<OffsetDateTime>,
	weighted_tf: HashMap<String, f64>,
	term_count: usize,
}
impl IndexedDocument {
	fn from_document(document: LexicalDocument) -> Self {
		let mut weighted_tf = HashMap::new();
		let mut term_count = 0;
		let tags = document.tags.join(" ");
		let fields = [
			(Some(document.title.as_str()), TITLE_WEIGHT),
			(document.category.as_deref(), CATEGORY_WEIGHT),
			(Some(tags.as_str()), TAGS_WEIGHT),
			(document.summary.as_deref(), SUMMARY_WEIGHT),
			(document.author.as_deref(), AUTHOR_WEIGHT),
			(document.body.as_deref(), BODY_WEIGHT),
		];

		for (text, weight) in fields {
			for term in tokenize(text.unwrap_or_default()) {
				*weighted_tf.entry(term).or_insert(0.0) += weight;
				term_count += 1;
			}
		}

		Self {
			doc_id: document.doc_id,
			feed_id: document.feed_id,
			title: document.title,
			published_at: document.published_at,
			weighted_tf,
			term_count,
		}
	}

	fn score(&self, terms: &[String]) -> Option<f64> {
		let mut total = 0.0;

		for term in terms {
			total += self.weighted_tf.get(term)?;
		}

		Some(total / (1.0 + (1.0 + self.term_count as f64).ln()))
	}
}

/// Lower-cased Unicode words.
pub fn tokenize(text: &str) -> Vec<String> {
	text.unicode_words().map(str::to_lowercase).collect()
}

/// Brute-force in-process index over a fixed document set.
#[derive(Debug, Default)]
pub struct MemoryLexicalIndex {
	documents: Vec<IndexedDocument>,
}
impl MemoryLexicalIndex {
	pub fn new(documents: impl IntoIterator<Item = LexicalDocument>) -> Self {
		Self { documents: documents.into_iter().map(IndexedDocument::from_document).collect() }
	}

	pub fn len(&self) -> usize {
		self.documents.len()
	}

	pub fn is_empty(&self) -> bool {
		self.documents.is_empty()
	}

	pub fn rank(&self, context: &RetrievalContext, k: usize) -> Vec<DocScore> {
		let Some(text) = context.text() else { return Vec::new() };
		let mut terms = tokenize(text);

		terms.sort();
		terms.dedup();

		if terms.is_empty() || k == 0 {
			return Vec::new();
		}

		let mut hits: Vec<DocScore> = self
			.documents
			.iter()
			.filter(|document| context.allows(document.feed_id))
			.filter_map(|document| {
				let score = document.score(&terms)?;

				Some(
					DocScore::new(document.doc_id, score)
						.with_published_at(document.published_at)
						.with_title(Some(document.title.clone())),
				)
			})
			.collect();

		hits.sort_by(|left, right| {
			feed_domain::cmp_f64_desc(left.score, right.score)
				.then_with(|| left.doc_id.cmp(&right.doc_id))
		});
		hits.truncate(k);

		hits
	}
}

impl LexicalIndex for MemoryLexicalIndex {
	fn search<'a>(
		&'a self,
		context: &'a RetrievalContext,
		k: usize,
	) -> BoxFuture<'a, Result<Vec<DocScore>>> {
		Box::pin(async move { Ok(self.rank(context, k)) })
	}
}

pub struct LexicalHandler {
	index: Arc<dyn LexicalIndex>,
	top_k: usize,
}
impl LexicalHandler {
	pub fn new(index: Arc<dyn LexicalIndex>, top_k: usize) -> Self {
		Self { index, top_k }
	}
}

impl RetrievalHandler for LexicalHandler {
	fn name(&self) -> &'static str {
		"lexical"
	}

	fn supports(&self, context: &RetrievalContext) -> bool {
		context.text().is_some()
	}

	fn handle<'a>(&'a self, context: &'a RetrievalContext) -> BoxFuture<'a, Result<Vec<DocScore>>> {
		self.index.search(context, self.top_k)
	}
}
