//! `GET /todos` の HTML 表示
//!
//! バケット分けの結果をそのまま 3 つのセクションに並べるだけの薄い表示層。
//! 値のエスケープは handlebars の既定（HTML エスケープ）に任せる。

use domain::{Bucket, Calendar, GroupedTodos, Todo, UserId};
use handlebars::Handlebars;
use serde::Serialize;
use shared::AppError;

const TODO_PAGE: &str = "todo_page";

const TODO_PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Todos</title>
</head>
<body>
  <header>
    <h1>My Todos</h1>
    <p class="signed-in">Signed in as {{user_id}}</p>
    <p class="total">{{total}} todos</p>
  </header>
  <form action="/todos" method="post" class="new-todo">
    <input type="text" name="title" placeholder="What's next?" required>
    <input type="date" name="dueDate" required>
    <button type="submit">Add</button>
  </form>
{{#each sections}}
  <section id="{{key}}">
    <h2>{{heading}} <span class="count">{{count}}</span></h2>
    <ul>
    {{#each items}}
      <li class="todo-item{{#if completed}} completed{{/if}}" data-id="{{id}}">
        <input type="checkbox" {{#if completed}}checked{{/if}}>
        <span class="title">{{title}}</span>
        <time datetime="{{due_date}}">{{due_label}}</time>
      </li>
    {{else}}
      <li class="empty">Nothing here</li>
    {{/each}}
    </ul>
  </section>
{{/each}}
</body>
</html>
"#;

#[derive(Debug, Serialize)]
struct TodoPage<'a> {
    user_id: &'a str,
    total: usize,
    sections: Vec<Section<'a>>,
}

#[derive(Debug, Serialize)]
struct Section<'a> {
    key: &'static str,
    heading: &'static str,
    count: usize,
    items: Vec<Item<'a>>,
}

#[derive(Debug, Serialize)]
struct Item<'a> {
    id: &'a str,
    title: &'a str,
    due_date: String,
    due_label: String,
    completed: bool,
}

pub struct TodoViews {
    registry: Handlebars<'static>,
}

impl TodoViews {
    pub fn new() -> Result<Self, AppError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_template_string(TODO_PAGE, TODO_PAGE_TEMPLATE)
            .map_err(|e| AppError::Internal(format!("template error: {e}")))?;
        Ok(Self { registry })
    }

    pub fn render_todo_page(
        &self,
        user_id: &UserId,
        grouped: &GroupedTodos,
        calendar: &Calendar,
    ) -> Result<String, AppError> {
        let sections = [
            (Bucket::Overdue, "overdue", "Overdue"),
            (Bucket::DueToday, "dueToday", "Due Today"),
            (Bucket::DueLater, "dueLater", "Due Later"),
        ]
        .into_iter()
        .map(|(bucket, key, heading)| {
            let todos = grouped.bucket(bucket);
            Section {
                key,
                heading,
                count: todos.len(),
                items: todos.iter().map(|todo| item(todo, calendar)).collect(),
            }
        })
        .collect();

        let page = TodoPage {
            user_id: user_id.as_str(),
            total: grouped.len(),
            sections,
        };

        self.registry
            .render(TODO_PAGE, &page)
            .map_err(|e| AppError::Internal(format!("render error: {e}")))
    }
}

fn item<'a>(todo: &'a Todo, calendar: &Calendar) -> Item<'a> {
    let local = todo.due_date.with_timezone(&calendar.offset());
    Item {
        id: todo.id.as_str(),
        title: &todo.title,
        due_date: local.to_rfc3339(),
        due_label: local.format("%Y-%m-%d %H:%M").to_string(),
        completed: todo.completed,
    }
}
