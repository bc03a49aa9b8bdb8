use domain::Calendar;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Unknown storage backend: {0}")]
    UnknownStorageBackend(String),
}

/// Todo の保存先
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Memory,
    DynamoDb,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "dynamodb" | "dynamo" => Ok(Self::DynamoDb),
            other => Err(ConfigError::UnknownStorageBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub storage_backend: StorageBackend,
    pub dynamodb_table: String,
    /// DynamoDB Local などの接続先。未設定なら AWS の既定エンドポイント
    pub dynamodb_endpoint: Option<String>,
    pub aws_region: String,
    /// 認証済みユーザー ID を運ぶリクエストヘッダ名
    pub identity_header: String,
    /// 未認証時のリダイレクト先
    pub login_path: String,
    pub calendar: Calendar,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "dev".to_string(),
            bind_addr: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            storage_backend: StorageBackend::Memory,
            dynamodb_table: "todo-tracker-dev".to_string(),
            dynamodb_endpoint: None,
            aws_region: "ap-northeast-1".to_string(),
            identity_header: "x-user-id".to_string(),
            login_path: "/login".to_string(),
            calendar: Calendar::utc(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を組み立てる（テストで環境変数を汚さないため）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => parse_value("BIND_ADDR", &raw)?,
            None => defaults.bind_addr,
        };
        let port = match get("PORT") {
            Some(raw) => parse_value("PORT", &raw)?,
            None => defaults.port,
        };
        let storage_backend = match get("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => defaults.storage_backend,
        };
        let calendar = match get("CALENDAR_UTC_OFFSET_MINUTES") {
            Some(raw) => {
                let minutes: i32 = parse_value("CALENDAR_UTC_OFFSET_MINUTES", &raw)?;
                Calendar::from_offset_minutes(minutes).map_err(|_| ConfigError::InvalidValue {
                    key: "CALENDAR_UTC_OFFSET_MINUTES",
                    value: raw,
                })?
            }
            None => defaults.calendar,
        };
        let login_path = get("LOGIN_PATH").unwrap_or(defaults.login_path);
        if !login_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                key: "LOGIN_PATH",
                value: login_path,
            });
        }

        Ok(Config {
            environment: get("ENVIRONMENT").unwrap_or(defaults.environment),
            bind_addr,
            port,
            storage_backend,
            dynamodb_table: get("DYNAMODB_TABLE").unwrap_or(defaults.dynamodb_table),
            dynamodb_endpoint: get("DYNAMODB_ENDPOINT"),
            aws_region: get("AWS_REGION").unwrap_or(defaults.aws_region),
            identity_header: get("IDENTITY_HEADER")
                .map(|h| h.trim().to_ascii_lowercase())
                .unwrap_or(defaults.identity_header),
            login_path,
            calendar,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// 開発環境ではエラーレスポンスに内部詳細を含める
    pub fn is_development(&self) -> bool {
        matches!(self.environment.as_str(), "dev" | "local" | "development")
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}
