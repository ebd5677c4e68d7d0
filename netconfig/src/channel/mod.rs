//! Channel layer: output accumulation and prompt search.

mod buffer;

pub use buffer::{DEFAULT_SEARCH_DEPTH, PatternBuffer};
