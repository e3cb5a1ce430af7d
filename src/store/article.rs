/// Row id assigned by SQLite on insert.
pub type ArticleId = i64;

/// A persisted article.
///
/// `content` is raw markup written by the author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
}

impl Article {
    /// Canonical detail path, also the redirect target after an update.
    pub fn path(&self) -> String {
        format!("/article/{}", self.id)
    }
}
