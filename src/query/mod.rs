pub mod builder;
pub mod concerned;
pub mod document;
pub mod filter;
pub mod search;

pub use builder::*;
pub use concerned::{ConcernedItemFilter, RegexConcernedItemFilter};
pub use document::*;
pub use filter::*;
pub use search::{prepare_by_id, prepare_search, SearchQueries};
