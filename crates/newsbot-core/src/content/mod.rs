mod extractor;

pub use extractor::{clean_text, ContentExtractor};
