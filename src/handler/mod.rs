//! Request handler module
//!
//! Responsible for request routing dispatch and the article operations.

mod articles;
mod error;
mod middleware;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
