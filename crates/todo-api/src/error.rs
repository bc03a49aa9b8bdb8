use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use shared::{AppError, ErrorCategory, ErrorResponse, RequestId};
use tracing::error;

/// ハンドラが返すエラー。レスポンス生成に必要な文脈を一緒に持つ
#[derive(Debug)]
pub struct ApiError {
    pub error: AppError,
    pub request_id: RequestId,
    pub expose_details: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.error.category() == ErrorCategory::Server {
            error!(request_id = %self.request_id, error = %self.error, "request failed");
        }

        let status = StatusCode::from_u16(self.error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse::from_app_error(
            &self.error,
            self.request_id.to_string(),
            self.expose_details,
        );
        (status, Json(body)).into_response()
    }
}

/// `302 Found` のリダイレクト
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
