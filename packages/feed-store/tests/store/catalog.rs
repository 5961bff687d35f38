use serde_json::json;

use super::{fixture_path, store, write_temp};
use feed_store::{Error, MemoryStore, Snapshot};

#[test]
fn fixture_loads_every_record() {
	let store = store();

	assert_eq!(store.item_count(), 5);
	assert_eq!(store.user_count(), 4);
	assert_eq!(store.item(3).map(|item| item.title.as_str()), Some("Gopher digest"));
	assert!(store.item(4).is_some_and(|item| item.published_at.is_none()));
}

#[test]
fn interactions_are_ordered_newest_first_with_undated_last() {
	let store = store();
	let ids: Vec<i64> = store
		.user(1)
		.map(|user| user.interactions.iter().map(|interaction| interaction.item_id).collect())
		.unwrap_or_default();

	assert_eq!(ids, vec![3, 1, 2]);
}

#[test]
fn missing_file_is_a_read_error() {
	let path = fixture_path().with_file_name("does_not_exist.json");

	assert!(matches!(MemoryStore::load(&path), Err(Error::ReadSnapshot { .. })));
}

#[test]
fn malformed_json_is_a_parse_error() {
	let path = write_temp("{ \"items\": [");
	let result = MemoryStore::load(&path);

	std::fs::remove_file(&path).ok();

	assert!(matches!(result, Err(Error::ParseSnapshot { .. })));
}

#[test]
fn dangling_references_are_rejected() {
	let snapshot: Snapshot = serde_json::from_value(json!({
		"items": [{ "id": 1, "feed_id": 10, "title": "Only item" }],
		"users": [{ "id": 7, "interactions": [{ "item_id": 99 }] }],
	}))
	.expect("Failed to build snapshot.");

	match MemoryStore::from_snapshot(snapshot) {
		Err(Error::Invalid { message }) => {
			assert!(message.contains("unknown item 99"), "{message}");
		},
		other => panic!("Expected an invalid snapshot, got {:?}.", other.err()),
	}
}

#[test]
fn duplicate_ids_and_blank_titles_are_rejected() {
	let duplicate: Snapshot = serde_json::from_value(json!({
		"items": [
			{ "id": 1, "feed_id": 10, "title": "First" },
			{ "id": 1, "feed_id": 10, "title": "Second" },
		],
	}))
	.expect("Failed to build snapshot.");
	let blank: Snapshot = serde_json::from_value(json!({
		"items": [{ "id": 2, "feed_id": 10, "title": "  " }],
	}))
	.expect("Failed to build snapshot.");

	assert!(matches!(MemoryStore::from_snapshot(duplicate), Err(Error::Invalid { .. })));
	assert!(matches!(MemoryStore::from_snapshot(blank), Err(Error::Invalid { .. })));
}
