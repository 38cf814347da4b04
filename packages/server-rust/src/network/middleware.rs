//! HTTP middleware for the gateway.
//!
//! Two tiers: a Tower stack applied to every route (request id, tracing,
//! compression, CORS, outer timeout) and axum `from_fn` middleware applied
//! only to business routes (proxy-token gate, in-flight tracking).
//! [`envelope_bare_timeout`] wraps everything so the outer timeout's 408
//! carries the same error body as every other failure.
//! Ordering is outer-to-inner: the first layer listed sees the request first.

use axum::extract::{Request, State};
use axum::http::header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use promptgate_core::GatewayError;
use subtle::ConstantTimeEq;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::config::NetworkConfig;
use super::error::ApiError;
use super::handlers::AppState;

/// Header carrying the shared secret for business routes.
pub const PROXY_TOKEN_HEADER: &str = "x-proxy-token";

/// The composed Tower layer type produced by [`build_http_layers`].
type HttpLayers = tower::layer::util::Stack<
    PropagateRequestIdLayer,
    tower::layer::util::Stack<
        TimeoutLayer,
        tower::layer::util::Stack<
            CorsLayer,
            tower::layer::util::Stack<
                CompressionLayer,
                tower::layer::util::Stack<
                    TraceLayer<
                        tower_http::classify::SharedClassifier<
                            tower_http::classify::ServerErrorsAsFailures,
                        >,
                    >,
                    tower::layer::util::Stack<
                        SetRequestIdLayer<MakeRequestUuid>,
                        tower::layer::util::Identity,
                    >,
                >,
            >,
        >,
    >,
>;

/// Builds the transport-level middleware stack applied to every route.
///
/// 1. `SetRequestId` assigns an `X-Request-Id` to every incoming request
/// 2. `Tracing` opens a span per request
/// 3. `Compression` gzips responses
/// 4. `CORS` from the configured origins
/// 5. `Timeout` answers 408 once `request_timeout` elapses
/// 6. `PropagateRequestId` copies `X-Request-Id` onto the response
#[must_use]
pub fn build_http_layers(config: &NetworkConfig) -> HttpLayers {
    let x_request_id = HeaderName::from_static("x-request-id");

    ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&config.cors_origins))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(PropagateRequestIdLayer::new(x_request_id))
        .into_inner()
}

/// A `"*"` entry allows any origin; otherwise unparseable origins are skipped.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Whether `headers` carry the expected proxy token.
///
/// Always true when no token is configured.
#[must_use]
pub fn proxy_token_matches(expected: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    headers
        .get(PROXY_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|presented| bool::from(presented.as_bytes().ct_eq(expected.as_bytes())))
}

/// Rejects business requests without the configured `x-proxy-token`.
///
/// Runs before body extraction, so an unauthenticated request never
/// reaches validation or a downstream call.
pub async fn require_proxy_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !proxy_token_matches(state.network.proxy_token.as_deref(), request.headers()) {
        return ApiError::from(GatewayError::unauthorized(
            "missing or invalid x-proxy-token header",
        ))
        .into_response();
    }
    next.run(request).await
}

/// Counts the request as in flight for graceful-shutdown draining.
pub async fn track_in_flight(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let _guard = state.shutdown.in_flight_guard();
    next.run(request).await
}

/// Replaces the empty 408 produced by the outer timeout with an error envelope.
///
/// Handler-rendered timeouts already carry a JSON body and pass through
/// unchanged.
pub async fn envelope_bare_timeout(response: Response) -> Response {
    if response.status() != StatusCode::REQUEST_TIMEOUT
        || response.headers().contains_key(CONTENT_TYPE)
    {
        return response;
    }
    let (mut parts, _) = response.into_parts();
    let (rendered, body) = ApiError::from(GatewayError::timeout(
        "request exceeded the server time limit",
    ))
    .into_response()
    .into_parts();
    parts.headers.remove(CONTENT_LENGTH);
    parts.headers.extend(rendered.headers);
    Response::from_parts(parts, body)
}
