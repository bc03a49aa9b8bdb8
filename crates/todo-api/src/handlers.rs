use crate::error::{found, ApiError};
use crate::extract::{flexible_bool, wants_json, JsonOrForm, RequestContext};
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use domain::{BucketOrder, TodoId};
use lifecycle::{
    CreateTodoCommand, DeleteOutcome, DeleteTodoCommand, ListGroupedTodosQuery,
    ToggleCompletionCommand,
};
use serde::{Deserialize, Serialize};
use shared::AppError;
use tracing::instrument;

/// GET /todos のクエリ
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub order: BucketOrder,
}

/// POST /todos リクエスト（JSON またはフォーム）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(alias = "due_date")]
    pub due_date: String,
    #[serde(default, deserialize_with = "flexible_bool::deserialize")]
    pub completed: bool,
}

/// PUT /todos/:id リクエスト
///
/// チェックボックスは未チェック時に送信されないため、欠落は `false` とみなす。
#[derive(Debug, Deserialize)]
pub struct ToggleTodoRequest {
    #[serde(default, deserialize_with = "flexible_bool::deserialize")]
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    /// サービスの簡易ステータス
    status: &'static str,
}

/// ヘルスチェック用ハンドラ
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthBody { status: "ok" }))
}

/// 期限バケット一覧。`Accept` に応じて HTML か JSON を返す
#[instrument(skip_all, fields(user_id = %ctx.requester.user_id, request_id = %ctx.request_id))]
pub async fn list_todos(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) =
        params.map_err(|rejection| ctx.fail(AppError::BadRequest(rejection.body_text())))?;
    let query = ListGroupedTodosQuery::on(state.lifecycle.today()).ordered_by(params.order);
    let grouped = state
        .lifecycle
        .list_grouped(&ctx.requester.user_id, query)
        .await
        .map_err(|e| ctx.fail(e))?;

    if wants_json(&headers) {
        return Ok((StatusCode::OK, Json(grouped)).into_response());
    }

    let html = state
        .views
        .render_todo_page(&ctx.requester.user_id, &grouped, state.lifecycle.calendar())
        .map_err(|e| ctx.fail(e))?;
    Ok((StatusCode::OK, Html(html)).into_response())
}

/// Todo 作成。成功時は一覧へリダイレクト
#[instrument(skip_all, fields(user_id = %ctx.requester.user_id, request_id = %ctx.request_id))]
pub async fn create_todo(
    State(state): State<AppState>,
    ctx: RequestContext,
    JsonOrForm(req): JsonOrForm<CreateTodoRequest>,
) -> Result<Response, ApiError> {
    let command = CreateTodoCommand::new(req.title, req.due_date).completed(req.completed);
    state
        .lifecycle
        .create(&ctx.requester.user_id, command)
        .await
        .map_err(|e| ctx.fail(e))?;

    Ok(found("/todos"))
}

/// 完了状態の切り替え。更新後の Todo を返す
#[instrument(skip_all, fields(user_id = %ctx.requester.user_id, todo_id = %id))]
pub async fn toggle_todo(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    JsonOrForm(req): JsonOrForm<ToggleTodoRequest>,
) -> Result<Response, ApiError> {
    let todo_id = TodoId::from_string(id).map_err(|e| ctx.fail(e))?;
    let command = ToggleCompletionCommand {
        todo_id,
        completed: req.completed,
    };

    let updated = state
        .lifecycle
        .toggle_completion(&ctx.requester.user_id, command)
        .await
        .map_err(|e| ctx.fail(e))?;

    Ok((StatusCode::OK, Json(updated)).into_response())
}

/// 削除。他人の Todo や存在しない Todo でもエラーにせず `success: false`
#[instrument(skip_all, fields(user_id = %ctx.requester.user_id, todo_id = %id))]
pub async fn delete_todo(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    let todo_id = match TodoId::from_string(id) {
        Ok(todo_id) => todo_id,
        Err(_) => return Ok(Json(DeleteOutcome::nothing_removed())),
    };

    let outcome = state
        .lifecycle
        .delete(&ctx.requester.user_id, DeleteTodoCommand { todo_id })
        .await
        .map_err(|e| ctx.fail(e))?;

    Ok(Json(outcome))
}
