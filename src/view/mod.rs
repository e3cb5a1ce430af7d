//! Server-rendered pages
//!
//! Templates are compiled into the binary. When a template directory is
//! configured, a file there with the same name replaces the built-in
//! template; files are re-read on every render so edits show up without a
//! restart.

mod template;

use crate::store::Article;
use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};
use template::{escape_html, substitute};
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read template {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy)]
enum Template {
    Base,
    Index,
    IndexItem,
    New,
    Article,
    Edit,
}

impl Template {
    const fn file_name(self) -> &'static str {
        match self {
            Self::Base => "base.html",
            Self::Index => "index.html",
            Self::IndexItem => "index_item.html",
            Self::New => "new.html",
            Self::Article => "article.html",
            Self::Edit => "edit.html",
        }
    }

    const fn embedded(self) -> &'static str {
        match self {
            Self::Base => include_str!("templates/base.html"),
            Self::Index => include_str!("templates/index.html"),
            Self::IndexItem => include_str!("templates/index_item.html"),
            Self::New => include_str!("templates/new.html"),
            Self::Article => include_str!("templates/article.html"),
            Self::Edit => include_str!("templates/edit.html"),
        }
    }
}

pub struct Renderer {
    template_dir: Option<PathBuf>,
    escape_content: bool,
}

impl Renderer {
    pub fn new(template_dir: Option<&str>, escape_content: bool) -> Self {
        Self {
            template_dir: template_dir.map(PathBuf::from),
            escape_content,
        }
    }

    /// List page.
    pub fn index(&self, articles: &[Article]) -> RenderResult<String> {
        let items = if articles.is_empty() {
            "    <li class=\"empty\">No articles yet.</li>\n".to_string()
        } else {
            let item = self.load(Template::IndexItem)?;
            articles
                .iter()
                .map(|article| {
                    substitute(
                        &item,
                        &[
                            ("id", article.id.to_string().as_str()),
                            ("title", escape_html(&article.title).as_str()),
                        ],
                    )
                })
                .collect()
        };

        let body = substitute(&self.load(Template::Index)?, &[("articles", items.as_str())]);
        self.page("Articles", &body)
    }

    /// Empty creation form.
    pub fn new_article(&self) -> RenderResult<String> {
        let body = self.load(Template::New)?;
        self.page("New article", &body)
    }

    /// Detail page.
    pub fn article(&self, article: &Article) -> RenderResult<String> {
        // Content is author markup; it is only escaped when configured to be.
        let content: Cow<'_, str> = if self.escape_content {
            Cow::Owned(escape_html(&article.content))
        } else {
            Cow::Borrowed(&article.content)
        };
        let title = escape_html(&article.title);

        let body = substitute(
            &self.load(Template::Article)?,
            &[
                ("id", article.id.to_string().as_str()),
                ("title", title.as_str()),
                ("content", content.as_ref()),
            ],
        );
        self.page(&article.title, &body)
    }

    /// Edit form pre-filled with the current title and content.
    pub fn edit(&self, article: &Article) -> RenderResult<String> {
        // Inside the form everything is text, so content is always escaped.
        let body = substitute(
            &self.load(Template::Edit)?,
            &[
                ("id", article.id.to_string().as_str()),
                ("title", escape_html(&article.title).as_str()),
                ("content", escape_html(&article.content).as_str()),
            ],
        );
        self.page(&format!("Edit {}", article.title), &body)
    }

    fn page(&self, page_title: &str, body: &str) -> RenderResult<String> {
        let base = self.load(Template::Base)?;
        Ok(substitute(
            &base,
            &[("page_title", escape_html(page_title).as_str()), ("body", body)],
        ))
    }

    fn load(&self, template: Template) -> RenderResult<Cow<'static, str>> {
        if let Some(dir) = &self.template_dir {
            if let Some(text) = read_override(dir, template.file_name())? {
                return Ok(Cow::Owned(text));
            }
        }
        Ok(Cow::Borrowed(template.embedded()))
    }
}

/// A missing override file means "use the built-in template".
fn read_override(dir: &Path, file_name: &str) -> RenderResult<Option<String>> {
    let path = dir.join(file_name);
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(RenderError::Template { path, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: i64, title: &str, content: &str) -> Article {
        Article {
            id,
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_index_lists_titles() {
        let renderer = Renderer::new(None, false);
        let html = renderer
            .index(&[article(1, "Hello", ""), article(2, "<b>Bold</b>", "")])
            .unwrap();

        assert!(html.contains("<a href=\"/article/1\">Hello</a>"));
        assert!(html.contains("<a href=\"/article/2\">&lt;b&gt;Bold&lt;/b&gt;</a>"));
        assert!(html.contains("<title>Articles | Blog</title>"));
        assert!(!html.contains("No articles yet."));
    }

    #[test]
    fn test_index_empty_state() {
        let html = Renderer::new(None, false).index(&[]).unwrap();
        assert!(html.contains("No articles yet."));
    }

    #[test]
    fn test_article_content_trusted_by_default() {
        let html = Renderer::new(None, false)
            .article(&article(5, "T", "<p>para</p>"))
            .unwrap();
        assert!(html.contains("<p>para</p>"));
        assert!(html.contains("action=\"/article/5\""));
        assert!(html.contains("name=\"_method\" value=\"DELETE\""));
    }

    #[test]
    fn test_article_content_escaped_when_configured() {
        let html = Renderer::new(None, true)
            .article(&article(5, "T", "<script>x</script>"))
            .unwrap();
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!html.contains("<script>x"));
    }

    #[test]
    fn test_edit_form_prefilled() {
        let html = Renderer::new(None, false)
            .edit(&article(1, "Say \"hi\"", "</textarea>World"))
            .unwrap();
        assert!(html.contains("value=\"Say &quot;hi&quot;\""));
        assert!(html.contains(">&lt;/textarea&gt;World</textarea>"));
        assert!(html.contains("name=\"_method\" value=\"PUT\""));
    }

    #[test]
    fn test_template_dir_overrides_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("new.html"), "<p>custom form</p>").unwrap();

        let renderer = Renderer::new(dir.path().to_str(), false);
        let html = renderer.new_article().unwrap();

        assert!(html.contains("<p>custom form</p>"));
        // base.html is not overridden and falls back to the built-in one
        assert!(html.contains("<title>New article | Blog</title>"));
    }

    #[test]
    fn test_unreadable_override_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("base.html")).unwrap();

        let err = Renderer::new(dir.path().to_str(), false)
            .new_article()
            .unwrap_err();
        assert!(err.to_string().contains("base.html"));
    }
}
