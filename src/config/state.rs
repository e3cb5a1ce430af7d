// Application state module
// Everything a request needs, built once in main and shared through Arc

use super::types::Config;
use crate::store::ArticleStore;
use crate::view::Renderer;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: ArticleStore,
    pub renderer: Renderer,
}

impl AppState {
    /// Takes an already-initialized store so the schema exists before any
    /// request can reach it.
    pub fn new(config: Config, store: ArticleStore) -> Self {
        let renderer = Renderer::new(
            config.render.template_dir.as_deref(),
            config.render.escape_content,
        );
        Self {
            config,
            store,
            renderer,
        }
    }
}
