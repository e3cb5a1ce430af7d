//! Cross-cutting request steps: the `_method` override and the article
//! context loader.

use super::error::{HandlerError, HandlerResult};
use crate::config::AppState;
use crate::http::FormData;
use crate::store::{Article, ArticleId, ArticleStore, StoreError};
use hyper::Method;

/// Form field a POST uses to ask for another method.
pub const METHOD_FIELD: &str = "_method";

/// Effective method of a request.
///
/// A POST whose body carries `_method` set to exactly `PUT`, `PATCH` or
/// `DELETE` is treated as that method. Must run before route matching.
pub fn method_override(method: &Method, form: &FormData) -> Method {
    if method != Method::POST {
        return method.clone();
    }

    match form.body_value(METHOD_FIELD) {
        Some("PUT") => Method::PUT,
        Some("PATCH") => Method::PATCH,
        Some("DELETE") => Method::DELETE,
        _ => Method::POST,
    }
}

/// Resolve `raw_id` and run `next` with the loaded article.
///
/// An id that is not a number or names no row ends the request with
/// [`HandlerError::NotFound`]; `next` is not called.
pub fn article_ctx<F>(state: &AppState, raw_id: &str, next: F) -> HandlerResult
where
    F: FnOnce(Article) -> HandlerResult,
{
    let article = load_article(&state.store, raw_id)?;
    next(article)
}

fn load_article(store: &ArticleStore, raw_id: &str) -> Result<Article, HandlerError> {
    let id: ArticleId = raw_id.parse().map_err(|_| HandlerError::NotFound)?;
    store.get(id).map_err(|err| match err {
        StoreError::NotFound(_) => HandlerError::NotFound,
        other => HandlerError::Store(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_form(body: &str) -> FormData {
        FormData::from_request(
            Some("application/x-www-form-urlencoded"),
            body.as_bytes(),
            None,
        )
    }

    #[test]
    fn test_override_rewrites_post() {
        assert_eq!(method_override(&Method::POST, &post_form("_method=PUT")), Method::PUT);
        assert_eq!(method_override(&Method::POST, &post_form("_method=PATCH")), Method::PATCH);
        assert_eq!(
            method_override(&Method::POST, &post_form("title=x&_method=DELETE")),
            Method::DELETE
        );
    }

    #[test]
    fn test_override_requires_exact_value() {
        for body in ["_method=FOOBAR", "_method=delete", "_method=GET", "_method=", ""] {
            assert_eq!(method_override(&Method::POST, &post_form(body)), Method::POST, "{body}");
        }
    }

    #[test]
    fn test_override_only_applies_to_post() {
        let form = post_form("_method=DELETE");
        assert_eq!(method_override(&Method::GET, &form), Method::GET);
        assert_eq!(method_override(&Method::PUT, &form), Method::PUT);
    }

    #[test]
    fn test_load_article() {
        let store = ArticleStore::open_in_memory().unwrap();
        let id = store.create("Hello", "World").unwrap();

        assert_eq!(load_article(&store, &id.to_string()).unwrap().title, "Hello");
        assert!(matches!(load_article(&store, "999"), Err(HandlerError::NotFound)));
        assert!(matches!(load_article(&store, "abc"), Err(HandlerError::NotFound)));
        assert!(matches!(load_article(&store, "1.5"), Err(HandlerError::NotFound)));
    }
}
