use crate::errors::AppError;
use domain::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_REQUEST_ID_LENGTH: usize = 128;

/// リクエスト単位の相関 ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// 受信ヘッダの値を引き継ぐ。使えない値なら新しく採番する
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v)
                if !v.is_empty()
                    && v.len() <= MAX_REQUEST_ID_LENGTH
                    && v.chars().all(|c| c.is_ascii_graphic()) =>
            {
                Self(v.to_string())
            }
            _ => Self::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 外部の ID プロバイダが認証済みとした呼び出し元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub user_id: UserId,
}

impl Requester {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    /// ID ヘッダの値から呼び出し元を復元する。無い・空なら未認証
    pub fn from_identity(value: Option<&str>) -> Result<Self, AppError> {
        let raw = value.ok_or(AppError::Unauthenticated)?;
        UserId::from_string(raw.to_string())
            .map(Self::new)
            .map_err(|_| AppError::Unauthenticated)
    }
}
