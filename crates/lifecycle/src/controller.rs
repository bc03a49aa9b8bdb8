use crate::clock::{Clock, SystemClock};
use crate::commands::{CreateTodoCommand, DeleteTodoCommand, ToggleCompletionCommand};
use crate::queries::ListGroupedTodosQuery;
use crate::responses::DeleteOutcome;
use chrono::NaiveDate;
use domain::{
    check_ownership, Access, Calendar, GroupedTodos, NewTodo, Todo, TodoError, TodoGrouper,
    UserId,
};
use infrastructure::{StoreError, TodoRepository};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Todo の作成・完了切り替え・削除・一覧を担うコントローラ
///
/// 変更系は「取得 → 所有者チェック → 条件付き書き込み」の順に進む。
/// 一覧系は「所有者の Todo を取得 → 期限でバケット分け」。
#[derive(Clone)]
pub struct TodoLifecycle {
    repo: Arc<dyn TodoRepository>,
    grouper: TodoGrouper,
    clock: Arc<dyn Clock>,
}

impl TodoLifecycle {
    pub fn new(repo: Arc<dyn TodoRepository>, calendar: Calendar) -> Self {
        Self::with_clock(repo, calendar, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repo: Arc<dyn TodoRepository>,
        calendar: Calendar,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            grouper: TodoGrouper::new(calendar),
            clock,
        }
    }

    pub fn calendar(&self) -> &Calendar {
        self.grouper.calendar()
    }

    /// 設定されたカレンダーでの「今日」
    pub fn today(&self) -> NaiveDate {
        self.calendar().date_of(self.clock.now())
    }

    #[instrument(skip(self, command), fields(user_id = %requester))]
    pub async fn create(
        &self,
        requester: &UserId,
        command: CreateTodoCommand,
    ) -> Result<Todo, TodoError> {
        // 検証はストアに触れる前にすべて済ませる
        let due_date = self.calendar().parse_due_date(&command.due_date)?;
        let draft = NewTodo::new(&command.title, due_date, command.completed)?;

        let todo = Todo::create(draft, requester.clone(), self.clock.now());
        self.repo
            .create(&todo)
            .await
            .map_err(|e| store_failure("create", e))?;

        info!(todo_id = %todo.id, "todo created");
        Ok(todo)
    }

    #[instrument(skip(self, command), fields(user_id = %requester, todo_id = %command.todo_id))]
    pub async fn toggle_completion(
        &self,
        requester: &UserId,
        command: ToggleCompletionCommand,
    ) -> Result<Todo, TodoError> {
        let todo = self
            .repo
            .get(&command.todo_id)
            .await
            .map_err(|e| store_failure("get", e))?
            .ok_or_else(|| TodoError::NotFound(command.todo_id.clone()))?;

        if check_ownership(requester, &todo) == Access::Forbidden {
            warn!(owner_id = %todo.owner_id, "toggle rejected: requester is not the owner");
            return Err(TodoError::Forbidden(todo.id));
        }

        if todo.completed == command.completed {
            debug!(completed = todo.completed, "completion already in requested state");
            return Ok(todo);
        }

        // 取得後に削除・所有者変更があった場合はストアの条件式が弾く
        let updated = self
            .repo
            .update_completed(&todo.id, requester, command.completed, self.clock.now())
            .await
            .map_err(|e| match e {
                StoreError::OwnerMismatch(_) => {
                    warn!("toggle rejected by owner condition");
                    TodoError::from(e)
                }
                StoreError::NotFound(_) => TodoError::from(e),
                other => store_failure("update_completed", other),
            })?;

        info!(completed = updated.completed, "todo completion changed");
        Ok(updated)
    }

    #[instrument(skip(self, command), fields(user_id = %requester, todo_id = %command.todo_id))]
    pub async fn delete(
        &self,
        requester: &UserId,
        command: DeleteTodoCommand,
    ) -> Result<DeleteOutcome, TodoError> {
        let removed = self
            .repo
            .delete_owned(&command.todo_id, requester)
            .await
            .map_err(|e| store_failure("delete_owned", e))?;

        if removed {
            info!("todo deleted");
            Ok(DeleteOutcome::removed())
        } else {
            debug!("nothing deleted: todo missing or owned by another user");
            Ok(DeleteOutcome::nothing_removed())
        }
    }

    #[instrument(skip(self), fields(user_id = %requester))]
    pub async fn list_grouped(
        &self,
        requester: &UserId,
        query: ListGroupedTodosQuery,
    ) -> Result<GroupedTodos, TodoError> {
        let todos = self
            .repo
            .list_for_owner(requester)
            .await
            .map_err(|e| store_failure("list_for_owner", e))?;

        let grouped = self.grouper.group(todos, query.reference_date, query.order);
        debug!(
            overdue = grouped.overdue.len(),
            due_today = grouped.due_today.len(),
            due_later = grouped.due_later.len(),
            "todos grouped"
        );
        Ok(grouped)
    }
}

fn store_failure(operation: &'static str, e: StoreError) -> TodoError {
    error!(operation, error = %e, "todo store failure");
    TodoError::from(e)
}
