use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use shared::RequestId;
use tracing::{info, info_span, Instrument};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// リクエスト ID を採番（または引き継ぎ）し、スパンとレスポンスヘッダに載せる
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = RequestId::from_header(
        req.headers()
            .get(&REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    );
    req.extensions_mut().insert(id.clone());

    let span = info_span!(
        "http_request",
        request_id = %id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let mut response = async move {
        let response = next.run(req).await;
        info!(status = response.status().as_u16(), "request completed");
        response
    }
    .instrument(span)
    .await;

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
