use crate::err::Error;
use crate::files;
use crate::mime;
use crate::router::Router;
use crate::swapi::FilmClient;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::request::Parts;
use hyper::http::HeaderValue;
use hyper::{header, Method, Request, Response, StatusCode};
use std::path::PathBuf;
use std::sync::Arc;

mod films;

pub struct State {
    router: Router,
    root: PathBuf,
}

pub fn build(client: Arc<FilmClient>, root: PathBuf) -> State {
    let mut router = Router::default();
    router.get("/api/film/:id", move |params| {
        films::get(params, Arc::clone(&client))
    });
    State { router, root }
}

pub async fn respond_to_request<B>(req: Request<B>, state: Arc<State>) -> Response<Full<Bytes>> {
    // The body is never read; drop it before the first await.
    let (parts, _) = req.into_parts();
    match route(&parts, &state).await {
        Ok(resp) => resp,
        Err(e) => {
            log::error!("{} {} -> [internal error] {}", parts.method, parts.uri, e);
            internal_error()
        }
    }
}

async fn route(parts: &Parts, state: &State) -> Result<Response<Full<Bytes>>, Error> {
    if parts.method != Method::GET {
        log::warn!("{} {} -> [method not allowed]", parts.method, parts.uri);
        return status_only(StatusCode::METHOD_NOT_ALLOWED);
    }

    let path = parts.uri.path();

    // Registered routes take precedence over files with the same path.
    if let Some((params, handler)) = state.router.lookup(path) {
        let body = handler(params).await;
        log::info!("GET {} -> [handler {} bytes]", parts.uri, body.len());
        // The content type tracks the request path, not the payload.
        return with_content_type(Bytes::from(body), mime::content_type(path));
    }

    if let Some(contents) = files::resolve(&state.root, path).await {
        log::info!("GET {} -> [found {} bytes]", parts.uri, contents.len());
        let content_type = mime::content_type(files::document_path(path));
        return with_content_type(Bytes::from(contents), content_type);
    }

    log::info!("GET {} -> [not found]", parts.uri);
    status_only(StatusCode::NOT_FOUND)
}

fn status_only(status: StatusCode) -> Result<Response<Full<Bytes>>, Error> {
    let resp = Response::builder()
        .status(status)
        .body(Full::new(Bytes::new()))?;
    Ok(resp)
}

fn with_content_type(
    body: Bytes,
    content_type: &'static str,
) -> Result<Response<Full<Bytes>>, Error> {
    let resp = Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .body(Full::new(body))?;
    Ok(resp)
}

// The last-resort response; nothing in here can fail.
fn internal_error() -> Response<Full<Bytes>> {
    const BODY: &[u8] = br#"{"error":"Internal Server Error"}"#;
    let mut resp = Response::new(Full::new(Bytes::from_static(BODY)));
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    resp
}
