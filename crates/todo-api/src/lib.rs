//! HTTP API（axum）
//!
//! `/todos` の各ルートをライフサイクル操作に対応付ける。
//! 呼び出し元は上流のセッション層が付けるヘッダ（既定 `x-user-id`）で識別する。

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod views;

use axum::{
    middleware::from_fn,
    routing::{get, put},
    Router,
};
use infrastructure::{InMemoryTodoRepository, TodoRepository};
use lifecycle::TodoLifecycle;
use shared::{AppError, Config};
use std::sync::Arc;
use views::TodoViews;

/// アプリケーションの共有状態
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: TodoLifecycle,
    pub config: Arc<Config>,
    pub views: Arc<TodoViews>,
}

impl AppState {
    pub fn new(lifecycle: TodoLifecycle, config: Config) -> Result<Self, AppError> {
        Ok(Self {
            lifecycle,
            config: Arc::new(config),
            views: Arc::new(TodoViews::new()?),
        })
    }

    /// 指定したストアでライフサイクルを組み立てる
    pub fn with_repository(
        repo: Arc<dyn TodoRepository>,
        config: Config,
    ) -> Result<Self, AppError> {
        let lifecycle = TodoLifecycle::new(repo, config.calendar);
        Self::new(lifecycle, config)
    }
}

/// インメモリストアでルータを構築して返します。
pub fn app() -> Result<Router, AppError> {
    let state = AppState::with_repository(
        Arc::new(InMemoryTodoRepository::new()),
        Config::default(),
    )?;
    Ok(app_with_state(state))
}

/// 外部から状態を注入できる版
pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/todos", get(handlers::list_todos).post(handlers::create_todo))
        .route(
            "/todos/:id",
            put(handlers::toggle_todo).delete(handlers::delete_todo),
        )
        .layer(from_fn(middleware::request_id))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{self, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use chrono::{TimeZone, Utc};
    use domain::UserId;
    use lifecycle::ManualClock;
    use tower::ServiceExt; // for `oneshot`

    /// 時刻を 2024-05-01 12:00 UTC に固定したアプリ
    fn test_app() -> (Router, Arc<InMemoryTodoRepository>) {
        let repo = Arc::new(InMemoryTodoRepository::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
        let config = Config::default();
        let lifecycle = TodoLifecycle::with_clock(repo.clone(), config.calendar, clock);
        let state = AppState::new(lifecycle, config).unwrap();
        (app_with_state(state), repo)
    }

    fn json_request(method: &str, uri: &str, user: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", user)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn bare_request(method: &str, uri: &str, user: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", user)
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// POST /todos で作成し、ストアに入った ID を返す
    async fn create(app: &Router, repo: &InMemoryTodoRepository, user: &str, title: &str, due: &str) -> String {
        let body = serde_json::json!({ "title": title, "dueDate": due });
        let response = app
            .clone()
            .oneshot(json_request("POST", "/todos", user, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);

        let owner = UserId::from_string(user.to_string()).unwrap();
        let todos = repo.list_for_owner(&owner).await.unwrap();
        todos
            .iter()
            .rev()
            .find(|t| t.title == title)
            .map(|t| t.id.to_string())
            .unwrap()
    }

    #[tokio::test]
    async fn get_health_returns_ok() {
        let app = app().unwrap();

        let request = Request::builder()
            .method("GET")
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn post_todos_redirects_to_list() {
        // Arrange
        let (app, repo) = test_app();
        let body = serde_json::json!({ "title": "Go to gym", "dueDate": "2024-05-01T18:00:00.000Z" });

        // Act
        let response = app
            .oneshot(json_request("POST", "/todos", "pranay", body))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/todos");
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn post_todos_accepts_form_body_and_ignores_csrf_field() {
        let (app, repo) = test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/todos")
            .header("x-user-id", "pranay")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("title=Pay+rent&dueDate=2024-05-03&completed=on&_csrf=abc123"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        let owner = UserId::from_string("pranay".to_string()).unwrap();
        let todos = repo.list_for_owner(&owner).await.unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "Pay rent");
        assert!(todos[0].completed);
    }

    #[tokio::test]
    async fn post_todos_with_invalid_input_returns_422() {
        let (app, repo) = test_app();
        let body = serde_json::json!({ "title": "   ", "dueDate": "2024-05-01" });

        let response = app
            .oneshot(json_request("POST", "/todos", "pranay", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn list_with_unknown_order_returns_400_error_body() {
        // Arrange
        let (app, _repo) = test_app();

        // Act: 未知の並び順を指定する
        let response = app
            .oneshot(bare_request("GET", "/todos?order=bogus", "pranay"))
            .await
            .unwrap();

        // Assert: 他のエラーと同じ JSON 形式で返る
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().contains_key("x-request-id"));
        let json = body_json(response).await;
        assert_eq!(json["code"], "BAD_REQUEST");
        assert!(json["requestId"].is_string());
    }

    #[tokio::test]
    async fn unauthenticated_requests_redirect_to_login() {
        let (app, repo) = test_app();

        for (method, uri) in [
            ("GET", "/todos"),
            ("POST", "/todos"),
            ("PUT", "/todos/01HXAMPLE"),
            ("DELETE", "/todos/01HXAMPLE"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"title":"x","dueDate":"2024-05-01","completed":true}"#))
                .unwrap();

            let response = app.clone().oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::FOUND, "{method} {uri}");
            assert_eq!(response.headers()[header::LOCATION], "/login");
        }
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn toggling_another_users_todo_returns_422() {
        // Arrange: niveditha の「Go to grocery store」を pranay が完了にしようとする
        let (app, repo) = test_app();
        let id = create(&app, &repo, "niveditha", "Go to grocery store", "2024-05-02").await;

        // Act
        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/todos/{id}"),
                "pranay",
                serde_json::json!({ "completed": true }),
            ))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["code"], "FORBIDDEN");

        let owner = UserId::from_string("niveditha".to_string()).unwrap();
        let todos = repo.list_for_owner(&owner).await.unwrap();
        assert!(!todos[0].completed);
    }

    #[tokio::test]
    async fn toggling_unknown_todo_returns_422() {
        let (app, _repo) = test_app();

        let response = app
            .oneshot(json_request(
                "PUT",
                "/todos/does-not-exist",
                "pranay",
                serde_json::json!({ "completed": true }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn todo_due_today_can_be_completed_and_reopened() {
        // Arrange
        let (app, repo) = test_app();
        let id = create(&app, &repo, "pranay", "Go to gym", "2024-05-01T18:00:00.000Z").await;

        // Act: 一覧で dueToday に入っていることを確認
        let listed = app
            .clone()
            .oneshot(bare_request("GET", "/todos", "pranay"))
            .await
            .unwrap();
        assert_eq!(listed.status(), StatusCode::OK);
        let grouped = body_json(listed).await;
        assert_eq!(grouped["dueToday"][0]["title"], "Go to gym");
        assert_eq!(grouped["dueToday"][0]["id"], id.as_str());
        assert!(grouped["overdue"].as_array().unwrap().is_empty());
        assert!(grouped["dueLater"].as_array().unwrap().is_empty());

        // Act & Assert: true にしてから false に戻す
        for desired in [true, false] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "PUT",
                    &format!("/todos/{id}"),
                    "pranay",
                    serde_json::json!({ "completed": desired }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let todo = body_json(response).await;
            assert_eq!(todo["completed"], desired);
            assert_eq!(todo["id"], id.as_str());
            assert_eq!(todo["userId"], "pranay");
        }
    }

    #[tokio::test]
    async fn toggle_accepts_form_checkbox_values() {
        let (app, repo) = test_app();
        let id = create(&app, &repo, "pranay", "Go to gym", "2024-05-01").await;

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/todos/{id}"))
            .header("x-user-id", "pranay")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("completed=on&_csrf=abc123"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["completed"], true);
    }

    #[tokio::test]
    async fn deleting_twice_reports_true_then_false() {
        let (app, repo) = test_app();
        let id = create(&app, &repo, "pranay", "Submit assignment", "2024-05-02").await;

        let mut results = Vec::new();
        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(bare_request("DELETE", &format!("/todos/{id}"), "pranay"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            results.push(body_json(response).await["success"].clone());
        }

        assert_eq!(results, vec![serde_json::json!(true), serde_json::json!(false)]);
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn deleting_another_users_todo_reports_false_and_keeps_it() {
        let (app, repo) = test_app();
        let id = create(&app, &repo, "niveditha", "Go to grocery store", "2024-05-02").await;

        let response = app
            .oneshot(bare_request("DELETE", &format!("/todos/{id}"), "pranay"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], false);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn list_groups_only_the_requesters_todos() {
        // Arrange
        let (app, repo) = test_app();
        create(&app, &repo, "pranay", "Pay rent", "2024-04-28").await;
        create(&app, &repo, "pranay", "File taxes", "2024-05-20").await;
        create(&app, &repo, "niveditha", "Go to grocery store", "2024-05-01").await;

        // Act
        let response = app
            .oneshot(bare_request("GET", "/todos", "pranay"))
            .await
            .unwrap();

        // Assert
        let grouped = body_json(response).await;
        assert_eq!(grouped["overdue"].as_array().unwrap().len(), 1);
        assert_eq!(grouped["overdue"][0]["title"], "Pay rent");
        assert!(grouped["dueToday"].as_array().unwrap().is_empty());
        assert_eq!(grouped["dueLater"][0]["title"], "File taxes");
    }

    #[tokio::test]
    async fn list_can_order_buckets_by_due_date() {
        let (app, repo) = test_app();
        create(&app, &repo, "pranay", "evening", "2024-05-01T20:00:00Z").await;
        create(&app, &repo, "pranay", "morning", "2024-05-01T07:00:00Z").await;

        let response = app
            .oneshot(bare_request("GET", "/todos?order=due_date", "pranay"))
            .await
            .unwrap();

        let grouped = body_json(response).await;
        assert_eq!(grouped["dueToday"][0]["title"], "morning");
        assert_eq!(grouped["dueToday"][1]["title"], "evening");
    }

    #[tokio::test]
    async fn list_renders_html_without_json_accept() {
        let (app, repo) = test_app();
        create(&app, &repo, "pranay", "Go to gym", "2024-05-01T18:00:00Z").await;

        let request = Request::builder()
            .method("GET")
            .uri("/todos")
            .header("x-user-id", "pranay")
            .header(header::ACCEPT, "text/html")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains(r#"<section id="dueToday">"#));
        assert!(html.contains("Go to gym"));
    }

    #[tokio::test]
    async fn request_id_header_is_propagated() {
        let (app, _repo) = test_app();
        let request = Request::builder()
            .method("GET")
            .uri("/todos")
            .header("x-user-id", "pranay")
            .header("x-request-id", "req-123")
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.headers()["x-request-id"], "req-123");
    }
}
