pub mod freshness;
pub mod score_mapping;
pub mod scored;
pub mod time_serde;
pub mod vector;

pub use freshness::{FreshnessDecay, MIN_DECAY_LAMBDA, blend_freshness};
pub use score_mapping::ScoreMapping;
pub use scored::{AttributePreference, Metadata, ScoredId, cmp_f64_desc, sort_scores_desc};
pub use vector::cosine_similarity;
