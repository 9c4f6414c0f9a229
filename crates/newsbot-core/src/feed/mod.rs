mod filter;
mod models;
mod parser;
mod source;

pub use filter::should_skip;
pub use models::{Article, Item, NewArticle, NewSource, Source};
pub use parser::parse_items;
pub use source::{FeedSource, SourceAdapter};
