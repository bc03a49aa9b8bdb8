use crate::errors::DomainError;
use crate::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    /// 外部から渡された ID を受け取る
    ///
    /// ID は不透明な値として扱うため、ULID 形式でなくても受け付ける。
    /// 存在しない ID は検索時に NotFound として扱われる。
    pub fn from_string(s: String) -> Result<Self, DomainError> {
        if s.trim().is_empty() {
            return Err(DomainError::InvalidTodoId(
                "Todo ID cannot be empty".to_string(),
            ));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn timestamp_ms(&self) -> Option<u64> {
        Ulid::from_string(&self.0)
            .ok()
            .map(|ulid| ulid.timestamp_ms())
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

/// 検証済みの作成入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    title: String,
    due_date: DateTime<Utc>,
    completed: bool,
}

impl NewTodo {
    pub fn new(title: &str, due_date: DateTime<Utc>, completed: bool) -> Result<Self, DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::InvalidTitle(
                "Title cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            title: title.to_string(),
            due_date,
            completed,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn due_date(&self) -> DateTime<Utc> {
        self.due_date
    }

    pub fn completed(&self) -> bool {
        self.completed
    }
}

/// ユーザーが所有する Todo
///
/// 所有者 (`owner_id`) は作成時に決まり、以後変わらない。
/// `completed` を変更できるのは所有者による完了切り替え操作のみ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub completed: bool,
    #[serde(rename = "userId")]
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn create(draft: NewTodo, owner_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: TodoId::new(),
            title: draft.title,
            due_date: draft.due_date,
            completed: draft.completed,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.owner_id == user_id
    }

    /// 完了フラグを設定する。値が変わった場合のみ `updated_at` を進め、`true` を返す。
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) -> bool {
        if self.completed == completed {
            return false;
        }
        self.completed = completed;
        self.updated_at = now;
        true
    }
}
