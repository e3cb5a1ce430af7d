//! Route matching module
//!
//! Matches (method, path) against the fixed route table. Patterns are
//! compared segment by segment; a `{id}` segment captures any non-empty
//! segment. GET routes also answer HEAD.

use hyper::Method;

/// Operation on a single, already-identified article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleAction {
    Show,
    Update,
    Delete,
    Edit,
}

/// Outcome of a successful match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Index,
    NewArticle,
    CreateArticle,
    /// Id-scoped route; `id` is the raw path segment, not yet resolved
    Article { action: ArticleAction, id: &'a str },
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Index,
    NewArticle,
    CreateArticle,
    Article(ArticleAction),
}

impl Target {
    fn bind(self, id: Option<&str>) -> Option<Route<'_>> {
        match self {
            Self::Index => Some(Route::Index),
            Self::NewArticle => Some(Route::NewArticle),
            Self::CreateArticle => Some(Route::CreateArticle),
            Self::Article(action) => id.map(|id| Route::Article { action, id }),
        }
    }
}

struct RouteDef {
    method: Method,
    pattern: &'static str,
    target: Target,
}

static ROUTES: [RouteDef; 7] = [
    RouteDef {
        method: Method::GET,
        pattern: "/",
        target: Target::Index,
    },
    RouteDef {
        method: Method::GET,
        pattern: "/article",
        target: Target::NewArticle,
    },
    RouteDef {
        method: Method::POST,
        pattern: "/article",
        target: Target::CreateArticle,
    },
    RouteDef {
        method: Method::GET,
        pattern: "/article/{id}",
        target: Target::Article(ArticleAction::Show),
    },
    RouteDef {
        method: Method::PUT,
        pattern: "/article/{id}",
        target: Target::Article(ArticleAction::Update),
    },
    RouteDef {
        method: Method::DELETE,
        pattern: "/article/{id}",
        target: Target::Article(ArticleAction::Delete),
    },
    RouteDef {
        method: Method::GET,
        pattern: "/article/{id}/edit",
        target: Target::Article(ArticleAction::Edit),
    },
];

/// Find the route for a method and path, if any.
pub fn match_route<'a>(method: &Method, path: &'a str) -> Option<Route<'a>> {
    let method = if method == Method::HEAD {
        &Method::GET
    } else {
        method
    };

    ROUTES
        .iter()
        .filter(|def| def.method == *method)
        .find_map(|def| match_pattern(def.pattern, path).and_then(|id| def.target.bind(id)))
}

/// `Some(captured_id)` when `path` fits `pattern`.
fn match_pattern<'a>(pattern: &str, path: &'a str) -> Option<Option<&'a str>> {
    let mut captured = None;
    let mut segments = path.split('/');

    for expected in pattern.split('/') {
        let actual = segments.next()?;
        if expected == "{id}" {
            if actual.is_empty() {
                return None;
            }
            captured = Some(actual);
        } else if expected != actual {
            return None;
        }
    }

    if segments.next().is_some() {
        return None;
    }
    Some(captured)
}
