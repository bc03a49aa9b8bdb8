use crate::repositories::StoreError;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, SecondsFormat, Utc};
use domain::{Todo, TodoId, UserId};
use std::collections::HashMap;

pub const TODO_SORT_KEY: &str = "TODO";
pub const OWNER_INDEX: &str = "GSI1";

/// DynamoDB Single Table Design のキー構造
///
/// - 本体: `PK = TODO#<id>`, `SK = TODO`（ID だけで引ける）
/// - GSI1: `GSI1PK = USER#<owner>`, `GSI1SK = <created_at>#<id>`（所有者ごとの作成順一覧）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoKeys {
    pub pk: String,
    pub sk: String,
}

impl TodoKeys {
    pub fn for_todo(todo_id: &TodoId) -> Self {
        Self {
            pk: format!("TODO#{}", todo_id.as_str()),
            sk: TODO_SORT_KEY.to_string(),
        }
    }

    pub fn owner_partition(owner: &UserId) -> String {
        format!("USER#{}", owner.as_str())
    }

    /// 作成時刻を固定幅で書き出し、文字列順 = 作成順になるようにする
    pub fn owner_sort_key(todo: &Todo) -> String {
        format!(
            "{}#{}",
            todo.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            todo.id.as_str()
        )
    }
}

pub fn timestamp_value(instant: DateTime<Utc>) -> AttributeValue {
    AttributeValue::S(instant.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

/// Todo を DynamoDB AttributeValue マップに変換
pub fn todo_to_item(todo: &Todo) -> HashMap<String, AttributeValue> {
    let keys = TodoKeys::for_todo(&todo.id);
    let mut map = HashMap::new();

    map.insert("PK".to_string(), AttributeValue::S(keys.pk));
    map.insert("SK".to_string(), AttributeValue::S(keys.sk));
    map.insert(
        "GSI1PK".to_string(),
        AttributeValue::S(TodoKeys::owner_partition(&todo.owner_id)),
    );
    map.insert(
        "GSI1SK".to_string(),
        AttributeValue::S(TodoKeys::owner_sort_key(todo)),
    );
    map.insert("Id".to_string(), AttributeValue::S(todo.id.as_str().to_string()));
    map.insert("Title".to_string(), AttributeValue::S(todo.title.clone()));
    map.insert("DueDate".to_string(), timestamp_value(todo.due_date));
    map.insert("Completed".to_string(), AttributeValue::Bool(todo.completed));
    map.insert(
        "OwnerId".to_string(),
        AttributeValue::S(todo.owner_id.as_str().to_string()),
    );
    map.insert("CreatedAt".to_string(), timestamp_value(todo.created_at));
    map.insert("UpdatedAt".to_string(), timestamp_value(todo.updated_at));

    map
}

/// DynamoDB AttributeValue マップから復元
pub fn item_to_todo(item: &HashMap<String, AttributeValue>) -> Result<Todo, StoreError> {
    let id = TodoId::from_string(string_attr(item, "Id")?)
        .map_err(|e| StoreError::MalformedItem(e.to_string()))?;
    let owner_id = UserId::from_string(string_attr(item, "OwnerId")?)
        .map_err(|e| StoreError::MalformedItem(e.to_string()))?;
    let completed = item
        .get("Completed")
        .and_then(|v| v.as_bool().ok())
        .copied()
        .ok_or_else(|| StoreError::MalformedItem("Missing Completed".to_string()))?;

    Ok(Todo {
        id,
        title: string_attr(item, "Title")?,
        due_date: timestamp_attr(item, "DueDate")?,
        completed,
        owner_id,
        created_at: timestamp_attr(item, "CreatedAt")?,
        updated_at: timestamp_attr(item, "UpdatedAt")?,
    })
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Result<String, StoreError> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| StoreError::MalformedItem(format!("Missing {name}")))
}

fn timestamp_attr(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> Result<DateTime<Utc>, StoreError> {
    let raw = string_attr(item, name)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::MalformedItem(format!("Invalid {name}: {raw}")))
}
