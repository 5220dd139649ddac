pub mod feed;
pub mod parser;

pub use parser::{parse_feed, ParsedFeed};
