//! リクエストからの値の取り出し

use crate::error::{found, ApiError};
use crate::AppState;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    response::Response,
    Form, Json,
};
use serde::de::DeserializeOwned;
use shared::{AppError, RequestId, Requester};

/// 認証済みリクエストの文脈
///
/// ID ヘッダが無ければログイン画面へ 302 でリダイレクトする。
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub requester: Requester,
    pub request_id: RequestId,
    pub expose_details: bool,
}

impl RequestContext {
    pub fn fail(&self, error: impl Into<AppError>) -> ApiError {
        ApiError {
            error: error.into(),
            request_id: self.request_id.clone(),
            expose_details: self.expose_details,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_default();

        let identity = parts
            .headers
            .get(state.config.identity_header.as_str())
            .and_then(|v| v.to_str().ok());

        match Requester::from_identity(identity) {
            Ok(requester) => Ok(Self {
                requester,
                request_id,
                expose_details: state.config.is_development(),
            }),
            Err(_) => {
                tracing::debug!(%request_id, "unauthenticated request redirected to login");
                Err(found(&state.config.login_path))
            }
        }
    }
}

/// `Accept` に `application/json` が含まれるか
pub fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|media| {
            media
                .split(';')
                .next()
                .map(|m| m.trim().eq_ignore_ascii_case("application/json"))
                .unwrap_or(false)
        })
}

/// JSON とフォームの両方を受け付けるボディ
///
/// `Content-Type` が JSON ならそのまま、それ以外は URL エンコードのフォームとして読む。
#[derive(Debug)]
pub struct JsonOrForm<T>(pub T);

#[async_trait]
impl<T> FromRequest<AppState> for JsonOrForm<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let request_id = req.extensions().get::<RequestId>().cloned().unwrap_or_default();
        let reject = |message: String| ApiError {
            error: AppError::Validation(message),
            request_id: request_id.clone(),
            expose_details: state.config.is_development(),
        };
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("application/json"))
            .unwrap_or(false);

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| reject(e.body_text()))?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| reject(e.body_text()))?;
            Ok(Self(value))
        }
    }
}

pub mod flexible_bool {
    //! フォームの `on` / `1` と JSON の真偽値の両方を受け付ける

    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolLike {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match BoolLike::deserialize(deserializer)? {
            BoolLike::Bool(b) => Ok(b),
            BoolLike::Int(1) => Ok(true),
            BoolLike::Int(0) => Ok(false),
            BoolLike::Int(n) => Err(de::Error::custom(format!("invalid completed value: {n}"))),
            BoolLike::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "1" => Ok(true),
                "false" | "off" | "0" | "" => Ok(false),
                other => Err(de::Error::custom(format!("invalid completed value: {other}"))),
            },
        }
    }
}
