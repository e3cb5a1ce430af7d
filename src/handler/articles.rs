//! Article handlers
//!
//! Id-scoped handlers receive the article already loaded by the context
//! loader and never query for it again.

use super::error::HandlerResult;
use crate::config::AppState;
use crate::http::{self, FormData};
use crate::logger;
use crate::store::Article;

pub fn list(state: &AppState) -> HandlerResult {
    let articles = state.store.list()?;
    logger::log_debug(&format!("[Articles] Listing {} articles", articles.len()));
    Ok(http::build_html_response(state.renderer.index(&articles)?))
}

pub fn new_form(state: &AppState) -> HandlerResult {
    Ok(http::build_html_response(state.renderer.new_article()?))
}

pub fn create(state: &AppState, form: &FormData) -> HandlerResult {
    let (title, content) = article_fields(form);
    let id = state.store.create(title, content)?;
    logger::log_info(&format!("[Articles] Created article {id}"));
    Ok(http::build_redirect_response("/"))
}

pub fn show(state: &AppState, article: &Article) -> HandlerResult {
    Ok(http::build_html_response(state.renderer.article(article)?))
}

pub fn edit(state: &AppState, article: &Article) -> HandlerResult {
    Ok(http::build_html_response(state.renderer.edit(article)?))
}

pub fn update(state: &AppState, article: &Article, form: &FormData) -> HandlerResult {
    let (title, content) = article_fields(form);
    state.store.update(article.id, title, content)?;
    logger::log_info(&format!("[Articles] Updated article {}", article.id));
    Ok(http::build_redirect_response(&article.path()))
}

pub fn delete(state: &AppState, article: &Article) -> HandlerResult {
    state.store.delete(article.id)?;
    logger::log_info(&format!("[Articles] Deleted article {}", article.id));
    Ok(http::build_redirect_response("/"))
}

/// Missing fields are stored as empty strings.
fn article_fields(form: &FormData) -> (&str, &str) {
    (
        form.value("title").unwrap_or_default(),
        form.value("content").unwrap_or_default(),
    )
}
