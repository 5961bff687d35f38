//! Multi-channel recall: strategy registry, quota planning, concurrent dispatch, and fusion.

pub mod cache;
pub mod collaborators;
pub mod context;
pub mod engine;
pub mod fusion;
pub mod planner;
pub mod registry;
pub mod strategies;
pub mod wiring;

mod error;
mod model;

pub use cache::{CachedStrategy, MemoryRecallCache, RecallCache, RecallCacheKey};
pub use collaborators::{
	AnnIndex, CoOccurIndex, EmbeddingStore, InvertedIndex, ItemFreshnessProvider, ItemKind,
	ItemProvider, SequenceStore, UserNeighbor, UserNeighborFinder, UserPreferenceService,
};
pub use context::{DefaultUserContextFactory, UserContextFactory};
pub use engine::{EngineSettings, RecallEngine};
pub use error::{Error, Result};
pub use fusion::{FreshnessSettings, FusionContext, FusionEngine, FusionOutcome};
pub use model::{
	ChannelResults, DiversityConfig, FusionConfig, ItemCandidate, RecallDiagnostics, RecallPlan,
	RecallRequest, RecallResponse, StrategyId, UserContext, UserInteraction,
};
pub use planner::RecallPlanner;
pub use registry::StrategyRegistry;
pub use strategies::RecallStrategy;
pub use wiring::{Collaborators, build_engine, build_registry};

use std::{future::Future, pin::Pin};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
