// MeteoAgent K-index source.
// HTTP client, widget markup parser, and the value types they produce.

pub mod client;
pub mod parser;
pub mod source;
pub mod types;

pub use client::MeteoAgentClient;
pub use parser::parse_kindex;
pub use source::KIndexSource;
pub use types::{Day, KIndex, Readings};
