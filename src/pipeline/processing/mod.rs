// Pipeline processing: query understanding and the fallback-driven list stages

pub mod dedup;
pub mod fallback;
pub mod normalize;
pub mod rank;
pub mod validate;

pub use fallback::{AnswerTable, FallbackMatcher, LiveProvider, PrecomputedAnswerProvider, Resolution, Resolver};
pub use normalize::{AttributeExtractionEngine, CategoryClassifier, QueryNormalizer};
pub use validate::ValidationCase;
