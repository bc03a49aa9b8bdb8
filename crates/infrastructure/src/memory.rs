use crate::repositories::{StoreError, StoreResult, TodoRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Todo, TodoId, UserId};
use indexmap::IndexMap;
use tokio::sync::RwLock;
use tracing::debug;

/// プロセス内で完結するストア（開発/テスト用）
///
/// 挿入順を保持するため `IndexMap` を使う。書き込みは単一の `RwLock` で直列化される。
#[derive(Default)]
pub struct InMemoryTodoRepository {
    todos: RwLock<IndexMap<TodoId, Todo>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.todos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.todos.read().await.is_empty()
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn get(&self, id: &TodoId) -> StoreResult<Option<Todo>> {
        Ok(self.todos.read().await.get(id).cloned())
    }

    async fn list_for_owner(&self, owner: &UserId) -> StoreResult<Vec<Todo>> {
        let todos = self.todos.read().await;
        Ok(todos
            .values()
            .filter(|todo| todo.is_owned_by(owner))
            .cloned()
            .collect())
    }

    async fn create(&self, todo: &Todo) -> StoreResult<()> {
        let mut todos = self.todos.write().await;
        if todos.contains_key(&todo.id) {
            return Err(StoreError::AlreadyExists(todo.id.clone()));
        }
        todos.insert(todo.id.clone(), todo.clone());
        debug!(todo_id = %todo.id, "todo inserted");
        Ok(())
    }

    async fn update_completed(
        &self,
        id: &TodoId,
        owner: &UserId,
        completed: bool,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Todo> {
        let mut todos = self.todos.write().await;
        let todo = todos
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if !todo.is_owned_by(owner) {
            return Err(StoreError::OwnerMismatch(id.clone()));
        }
        todo.set_completed(completed, updated_at);
        Ok(todo.clone())
    }

    async fn delete_owned(&self, id: &TodoId, owner: &UserId) -> StoreResult<bool> {
        let mut todos = self.todos.write().await;
        match todos.get(id) {
            Some(todo) if todo.is_owned_by(owner) => {
                // shift_remove で残りの挿入順を保つ
                todos.shift_remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
