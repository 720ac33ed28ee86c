use axum::{
    extract::Request,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
        },
        HeaderName, HeaderValue, Method, StatusCode,
    },
    middleware::{from_fn, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

pub const VERSION_HEADER: HeaderName = HeaderName::from_static("x-tsdb-version");

/// Wrap `router` so every response, including rejections and preflights,
/// carries the CORS and version headers
pub fn with_response_headers(router: Router, version: HeaderValue) -> Router {
    router
        .layer(from_fn(preflight))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static("2592000"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PUT, DELETE"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Origin, X-Requested-With, Content-Type, Accept"),
        ))
        .layer(SetResponseHeaderLayer::overriding(VERSION_HEADER, version))
}

/// `OPTIONS` is answered here and never reaches routing or the gate
pub async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}
