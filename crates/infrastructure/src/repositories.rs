use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Todo, TodoError, TodoId, UserId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Todo not found: {0}")]
    NotFound(TodoId),

    #[error("Owner condition failed for todo: {0}")]
    OwnerMismatch(TodoId),

    #[error("Todo already exists: {0}")]
    AlreadyExists(TodoId),

    #[error("DynamoDB error: {0}")]
    DynamoDb(String),

    #[error("Malformed item: {0}")]
    MalformedItem(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for TodoError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => TodoError::NotFound(id),
            StoreError::OwnerMismatch(id) => TodoError::Forbidden(id),
            other => TodoError::Store(other.to_string()),
        }
    }
}

/// Todo の永続化契約
///
/// 1 レコード単位の読み書きはアトミックであること。
/// `update_completed` と `delete_owned` は所有者を条件にした書き込みで、
/// 読み取りと書き込みの間に他のリクエストが削除しても中途半端な状態は残らない。
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn get(&self, id: &TodoId) -> StoreResult<Option<Todo>>;

    /// 所有者の Todo を作成順で返す
    async fn list_for_owner(&self, owner: &UserId) -> StoreResult<Vec<Todo>>;

    async fn create(&self, todo: &Todo) -> StoreResult<()>;

    /// 所有者が一致する場合のみ完了フラグを書き込み、更新後の Todo を返す
    async fn update_completed(
        &self,
        id: &TodoId,
        owner: &UserId,
        completed: bool,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Todo>;

    /// 所有者が一致するレコードを削除した場合のみ `true`
    async fn delete_owned(&self, id: &TodoId, owner: &UserId) -> StoreResult<bool>;
}
