use time::OffsetDateTime;

/// One retrieval query. Text drives the lexical channel, the embedding drives the vector channel.
#[derive(Clone, Debug)]
pub struct RetrievalContext {
	pub query: Option<String>,
	pub embedding: Option<Vec<f32>>,
	pub user_id: Option<i64>,
	/// When false both channels only see documents from `feed_ids`.
	pub include_global: bool,
	pub top_k: usize,
	pub feed_ids: Vec<i64>,
	/// Reference instant for the freshness blend.
	pub request_time: OffsetDateTime,
}
impl RetrievalContext {
	pub fn global(top_k: usize) -> Self {
		Self {
			query: None,
			embedding: None,
			user_id: None,
			include_global: true,
			top_k,
			feed_ids: Vec::new(),
			request_time: OffsetDateTime::now_utc(),
		}
	}

	pub fn scoped(user_id: i64, feed_ids: Vec<i64>, top_k: usize) -> Self {
		Self { user_id: Some(user_id), include_global: false, feed_ids, ..Self::global(top_k) }
	}

	pub fn with_query(mut self, query: impl Into<String>) -> Self {
		self.query = Some(query.into());

		self
	}

	pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
		self.embedding = Some(embedding);

		self
	}

	pub fn with_request_time(mut self, request_time: OffsetDateTime) -> Self {
		self.request_time = request_time;

		self
	}

	/// Trimmed query text, `None` when absent or blank.
	pub fn text(&self) -> Option<&str> {
		self.query.as_deref().map(str::trim).filter(|text| !text.is_empty())
	}

	pub fn vector(&self) -> Option<&[f32]> {
		self.embedding.as_deref().filter(|vector| !vector.is_empty())
	}

	/// Whether a document from `feed_id` is inside this query's scope.
	pub fn allows(&self, feed_id: Option<i64>) -> bool {
		if self.include_global {
			return true;
		}

		feed_id.is_some_and(|feed_id| self.feed_ids.contains(&feed_id))
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocScore {
	pub doc_id: i64,
	pub score: f64,
	pub published_at: Option<OffsetDateTime>,
	pub title: Option<String>,
}
impl DocScore {
	pub fn new(doc_id: i64, score: f64) -> Self {
		Self { doc_id, score, published_at: None, title: None }
	}

	pub fn with_published_at(mut self, published_at: Option<OffsetDateTime>) -> Self {
		self.published_at = published_at;

		self
	}

	pub fn with_title(mut self, title: Option<String>) -> Self {
		self.title = title;

		self
	}

	/// Case-insensitive trimmed title used for duplicate detection.
	pub fn title_key(&self) -> Option<String> {
		let title = self.title.as_deref()?.trim();

		if title.is_empty() { None } else { Some(title.to_lowercase()) }
	}
}
