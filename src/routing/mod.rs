//! Routing module
//!
//! Maps (method, path) pairs onto the blog's operations.

mod matcher;

pub use matcher::{match_route, ArticleAction, Route};
