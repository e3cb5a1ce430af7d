//! HTTP protocol layer module
//!
//! Response builders and form decoding, independent of the blog's routes.

pub mod form;
pub mod response;

pub use form::FormData;
pub use response::{
    build_400_response, build_404_response, build_413_response, build_500_response,
    build_html_response, build_redirect_response,
};
