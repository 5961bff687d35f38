//! Hybrid lexical and vector retrieval with weighted score fusion.

pub mod context;
pub mod inverted;
pub mod lexical;
pub mod pipeline;
pub mod search;
pub mod vector;

mod error;

pub use context::{DocScore, RetrievalContext};
pub use error::{Error, Result};
pub use inverted::RetrievalInvertedIndex;
pub use lexical::{LexicalDocument, LexicalHandler, LexicalIndex, MemoryLexicalIndex};
pub use pipeline::{HybridPipeline, RetrievalHandler};
pub use search::{QueryEmbedder, SearchRequest, SearchService, SubscriptionStore};
pub use vector::{MemoryVectorIndex, VectorDocument, VectorHandler, VectorSearch};

pub use feed_recall::BoxFuture;
