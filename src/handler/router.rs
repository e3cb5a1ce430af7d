//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body read, method override,
//! route matching, article context loading and dispatch, then the access log.

use super::articles;
use super::middleware;
use crate::config::AppState;
use crate::http::{self, FormData};
use crate::logger::{self, AccessLogEntry};
use crate::routing::{match_route, ArticleAction, Route};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, REFERER, SERVER, USER_AGENT};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request after body decoding and method override
pub struct RequestContext {
    /// Effective method, possibly rewritten from POST
    pub method: Method,
    pub path: String,
    pub form: FormData,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started_at = Instant::now();
    let is_head = req.method() == Method::HEAD;

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.referer = header_string(&req, REFERER.as_str());
    entry.user_agent = header_string(&req, USER_AGENT.as_str());

    let response = match read_request(req, state.config.http.max_body_size).await {
        Ok(ctx) => {
            entry.method = ctx.method.to_string();
            run_handler(ctx, Arc::clone(&state)).await
        }
        Err(resp) => resp,
    };
    let response = finalize(response, &state.config.http.server_name, is_head);

    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or_default();
        entry.request_time_us =
            u64::try_from(started_at.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Read the body within the size limit, decode form fields and apply the
/// method override.
async fn read_request<B>(
    req: Request<B>,
    max_body_size: u64,
) -> Result<RequestContext, Response<Full<Bytes>>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if let Some(resp) = check_body_size(&req, max_body_size) {
        return Err(resp);
    }

    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let bytes = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_warning(&format!(
                "Request body exceeded {max_body_size} bytes: {} {}",
                parts.method,
                parts.uri.path()
            ));
            return Err(http::build_413_response());
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return Err(http::build_400_response());
        }
    };

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let form = FormData::from_request(content_type, &bytes, parts.uri.query());

    let method = middleware::method_override(&parts.method, &form);
    if method != parts.method {
        logger::log_debug(&format!(
            "[Router] Method override {} -> {method} for {}",
            parts.method,
            parts.uri.path()
        ));
    }

    Ok(RequestContext {
        method,
        path: parts.uri.path().to_string(),
        form,
    })
}

/// Reject early when Content-Length already exceeds the limit
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            _ => None,
        },
    )
}

/// Store calls block, so the handler runs on the blocking pool and a slow
/// statement holds up only this request.
async fn run_handler(ctx: RequestContext, state: Arc<AppState>) -> Response<Full<Bytes>> {
    let label = format!("{} {}", ctx.method, ctx.path);
    tokio::task::spawn_blocking(move || dispatch(&ctx, &state))
        .await
        .unwrap_or_else(|e| {
            logger::log_error(&format!("{label} handler task failed: {e}"));
            http::build_500_response()
        })
}

/// Route the request and run its handler; every handler error is turned into
/// a response here.
fn dispatch(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    let Some(route) = match_route(&ctx.method, &ctx.path) else {
        logger::log_debug(&format!("[Router] No route for {} {}", ctx.method, ctx.path));
        return http::build_404_response();
    };

    let result = match route {
        Route::Index => articles::list(state),
        Route::NewArticle => articles::new_form(state),
        Route::CreateArticle => articles::create(state, &ctx.form),
        Route::Article { action, id } => middleware::article_ctx(state, id, |article| match action {
            ArticleAction::Show => articles::show(state, &article),
            ArticleAction::Update => articles::update(state, &article, &ctx.form),
            ArticleAction::Delete => articles::delete(state, &article),
            ArticleAction::Edit => articles::edit(state, &article),
        }),
    };

    result.unwrap_or_else(|err| err.into_response(&ctx.method, &ctx.path))
}

/// Stamp the `Server` header and drop the body of HEAD responses
fn finalize(
    mut response: Response<Full<Bytes>>,
    server_name: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    if let Ok(value) = HeaderValue::from_str(server_name) {
        response.headers_mut().insert(SERVER, value);
    }

    if is_head {
        let (parts, _) = response.into_parts();
        return Response::from_parts(parts, Full::new(Bytes::new()));
    }
    response
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
