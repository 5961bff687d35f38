use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use time::OffsetDateTime;

use crate::{Error, Result};
use feed_domain::ScoredId;
use feed_recall::UserInteraction;
use feed_retrieval::{LexicalDocument, VectorDocument};

#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
	#[serde(default)]
	pub items: Vec<ItemRecord>,
	#[serde(default)]
	pub users: Vec<UserRecord>,
	/// Optional explicit related-item table; items missing here fall back to vector similarity.
	#[serde(default)]
	pub co_occurrence: HashMap<i64, Vec<ScoredId>>,
}
impl Snapshot {
	pub fn validate(&self) -> Result<()> {
		let mut item_ids = HashSet::new();

		for item in &self.items {
			if !item_ids.insert(item.id) {
				return Err(invalid(format!("items contains duplicate id {}.", item.id)));
			}
			if item.title.trim().is_empty() {
				return Err(invalid(format!("items.{} must have a non-empty title.", item.id)));
			}
		}

		let mut user_ids = HashSet::new();

		for user in &self.users {
			if !user_ids.insert(user.id) {
				return Err(invalid(format!("users contains duplicate id {}.", user.id)));
			}

			for interaction in &user.interactions {
				if !item_ids.contains(&interaction.item_id) {
					return Err(invalid(format!(
						"users.{} references unknown item {}.",
						user.id, interaction.item_id
					)));
				}
			}
		}

		for seed in self.co_occurrence.keys() {
			if !item_ids.contains(seed) {
				return Err(invalid(format!("co_occurrence references unknown item {seed}.")));
			}
		}

		Ok(())
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct ItemRecord {
	pub id: i64,
	pub feed_id: i64,
	pub title: String,
	#[serde(default)]
	pub author: Option<String>,
	#[serde(default)]
	pub category: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub summary: Option<String>,
	#[serde(default)]
	pub body: Option<String>,
	#[serde(default, with = "feed_domain::time_serde::option")]
	pub published_at: Option<OffsetDateTime>,
	#[serde(default)]
	pub vector: Vec<f32>,
}
impl ItemRecord {
	pub fn lexical_document(&self) -> LexicalDocument {
		LexicalDocument {
			doc_id: self.id,
			feed_id: Some(self.feed_id),
			title: self.title.clone(),
			category: self.category.clone(),
			tags: self.tags.clone(),
			summary: self.summary.clone(),
			author: self.author.clone(),
			body: self.body.clone(),
			published_at: self.published_at,
		}
	}

	pub fn vector_document(&self) -> VectorDocument {
		VectorDocument {
			doc_id: self.id,
			feed_id: Some(self.feed_id),
			title: Some(self.title.clone()),
			published_at: self.published_at,
			vector: self.vector.clone(),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserRecord {
	pub id: i64,
	#[serde(default)]
	pub vector: Vec<f32>,
	#[serde(default)]
	pub subscriptions: Vec<i64>,
	#[serde(default)]
	pub interactions: Vec<UserInteraction>,
}

fn invalid(message: String) -> Error {
	Error::Invalid { message }
}
