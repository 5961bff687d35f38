use std::{path::Path, sync::Arc};

use feed_config::Config;
use feed_recall::{Collaborators, RecallEngine};
use feed_retrieval::{HybridPipeline, RetrievalInvertedIndex, SearchService};
use feed_store::MemoryStore;

/// Loads the catalog snapshot with the configured freshness half-life.
pub fn load_store(config: &Config, snapshot: &Path) -> color_eyre::Result<Arc<MemoryStore>> {
	let store = MemoryStore::load(snapshot)?.with_half_life_hours(config.fusion.half_life_hours);

	Ok(Arc::new(store))
}

#[derive(Clone)]
pub struct AppState {
	pub recall: Arc<RecallEngine>,
	pub search: Arc<SearchService>,
}
impl AppState {
	/// Wires the recall engine and hybrid search over one shared catalog.
	pub fn new(config: &Config, store: Arc<MemoryStore>) -> color_eyre::Result<Self> {
		let pipeline =
			HybridPipeline::from_config(&config.retrieval, store.clone(), store.clone());
		let collaborators = Collaborators {
			sequence_store: store.clone(),
			embeddings: store.clone(),
			ann: store.clone(),
			co_occur: store.clone(),
			inverted: Arc::new(RetrievalInvertedIndex::new(pipeline.clone())),
			preferences: store.clone(),
			neighbors: store.clone(),
			freshness: store.clone(),
			items: store.clone(),
		};
		let recall = feed_recall::build_engine(config, collaborators)?;
		let search = SearchService::new(pipeline, store, config.retrieval.fusion_top_k as usize);

		Ok(Self { recall: Arc::new(recall), search: Arc::new(search) })
	}
}
