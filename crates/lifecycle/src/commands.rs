use domain::TodoId;

/// Todo 作成コマンド
///
/// 入力は未検証の生の値。検証は `TodoLifecycle::create` がストア呼び出し前に行う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTodoCommand {
    pub title: String,
    /// RFC 3339 の日時、または `YYYY-MM-DD`
    pub due_date: String,
    pub completed: bool,
}

impl CreateTodoCommand {
    pub fn new(title: impl Into<String>, due_date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            due_date: due_date.into(),
            completed: false,
        }
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

/// 完了状態を指定値にそろえるコマンド（同じ値なら何もしない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleCompletionCommand {
    pub todo_id: TodoId,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTodoCommand {
    pub todo_id: TodoId,
}
