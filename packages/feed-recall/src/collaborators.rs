//! Read-only capabilities the recall core consumes. Implementations may be remote or in-memory.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{BoxFuture, Result, UserContext, UserInteraction};
use feed_domain::{AttributePreference, Metadata, ScoredId};

pub trait SequenceStore
where
	Self: Send + Sync,
{
	/// Most recent first.
	fn recent_interactions<'a>(
		&'a self,
		user_id: i64,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<UserInteraction>>>;
}

pub trait EmbeddingStore
where
	Self: Send + Sync,
{
	fn user_vector<'a>(&'a self, user_id: i64) -> BoxFuture<'a, Result<Option<Vec<f32>>>>;

	fn item_vector<'a>(&'a self, item_id: i64) -> BoxFuture<'a, Result<Option<Vec<f32>>>>;
}

pub trait AnnIndex
where
	Self: Send + Sync,
{
	fn query<'a>(
		&'a self,
		vector: &'a [f32],
		k: usize,
		filters: &'a Metadata,
	) -> BoxFuture<'a, Result<Vec<ScoredId>>>;
}

pub trait CoOccurIndex
where
	Self: Send + Sync,
{
	fn top_related<'a>(&'a self, item_id: i64, k: usize) -> BoxFuture<'a, Result<Vec<ScoredId>>>;
}

pub trait InvertedIndex
where
	Self: Send + Sync,
{
	fn query<'a>(
		&'a self,
		attributes: &'a [AttributePreference],
		k: usize,
	) -> BoxFuture<'a, Result<Vec<ScoredId>>>;
}

pub trait UserPreferenceService
where
	Self: Send + Sync,
{
	fn top_attributes<'a>(
		&'a self,
		user_id: i64,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<AttributePreference>>>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserNeighbor {
	pub user_id: i64,
	pub similarity: f64,
	pub top_items: Vec<ScoredId>,
}

pub trait UserNeighborFinder
where
	Self: Send + Sync,
{
	fn top_neighbors<'a>(
		&'a self,
		user_id: i64,
		k: usize,
	) -> BoxFuture<'a, Result<Vec<UserNeighbor>>>;
}

pub trait ItemFreshnessProvider
where
	Self: Send + Sync,
{
	/// Items with no known publish instant are absent from the map.
	fn published_at<'a>(
		&'a self,
		item_ids: &'a [i64],
	) -> BoxFuture<'a, Result<HashMap<i64, OffsetDateTime>>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
	Latest,
	Random,
}

pub trait ItemProvider
where
	Self: Send + Sync,
{
	fn ls<'a>(
		&'a self,
		context: &'a UserContext,
		kind: ItemKind,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<ScoredId>>>;
}
