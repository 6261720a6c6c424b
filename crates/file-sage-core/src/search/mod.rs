mod merge;
mod query;
mod rank;
mod strategy;

pub use merge::merge_results;
pub use query::SearchQuery;
pub use rank::{rank, score, ScoredResult, SearchHit};
pub(crate) use rank::round_to;
pub use strategy::{
    default_strategies, ContentKeywordStrategy, DateContextStrategy, FilenameStrategy,
    SearchStrategy, SizeContextStrategy, TypeKeywordStrategy,
};
