use crate::models::{item_to_todo, timestamp_value, todo_to_item, TodoKeys, OWNER_INDEX};
use crate::repositories::{StoreError, StoreResult, TodoRepository};
use async_trait::async_trait;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, GlobalSecondaryIndex, KeySchemaElement,
    KeyType, Projection, ProjectionType, ReturnValue, ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use domain::{Todo, TodoId, UserId};
use shared::Config;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct DynamoDbClient {
    client: Client,
    table_name: String,
}

impl DynamoDbClient {
    pub async fn new(config: &Config) -> Self {
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&aws_config);
        if let Some(endpoint) = &config.dynamodb_endpoint {
            // DynamoDB Local などへの接続
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            table_name: config.dynamodb_table.clone(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// テーブルが無ければ作成する（ローカル開発用）
    pub async fn ensure_table(&self) -> StoreResult<()> {
        let tables = self
            .client
            .list_tables()
            .send()
            .await
            .map_err(dynamo_error)?;
        if tables.table_names().iter().any(|name| name == &self.table_name) {
            return Ok(());
        }

        let string_attr = |name: &str| {
            AttributeDefinition::builder()
                .attribute_name(name)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(|e| StoreError::DynamoDb(e.to_string()))
        };
        let key = |name: &str, key_type: KeyType| {
            KeySchemaElement::builder()
                .attribute_name(name)
                .key_type(key_type)
                .build()
                .map_err(|e| StoreError::DynamoDb(e.to_string()))
        };

        let owner_index = GlobalSecondaryIndex::builder()
            .index_name(OWNER_INDEX)
            .key_schema(key("GSI1PK", KeyType::Hash)?)
            .key_schema(key("GSI1SK", KeyType::Range)?)
            .projection(
                Projection::builder()
                    .projection_type(ProjectionType::All)
                    .build(),
            )
            .build()
            .map_err(|e| StoreError::DynamoDb(e.to_string()))?;

        self.client
            .create_table()
            .table_name(&self.table_name)
            .billing_mode(BillingMode::PayPerRequest)
            .attribute_definitions(string_attr("PK")?)
            .attribute_definitions(string_attr("SK")?)
            .attribute_definitions(string_attr("GSI1PK")?)
            .attribute_definitions(string_attr("GSI1SK")?)
            .key_schema(key("PK", KeyType::Hash)?)
            .key_schema(key("SK", KeyType::Range)?)
            .global_secondary_indexes(owner_index)
            .send()
            .await
            .map_err(dynamo_error)?;

        info!(table = %self.table_name, "DynamoDB table created");
        Ok(())
    }
}

fn dynamo_error<E>(e: E) -> StoreError
where
    E: std::error::Error,
{
    StoreError::DynamoDb(DisplayErrorContext(e).to_string())
}

/// DynamoDB をバックエンドにした Todo ストア
///
/// 所有者の検証は条件式 (`OwnerId = :owner`) で書き込みと同時に行う。
pub struct DynamoTodoRepository {
    db: DynamoDbClient,
}

impl DynamoTodoRepository {
    pub fn new(db: DynamoDbClient) -> Self {
        Self { db }
    }

    fn key(&self, id: &TodoId) -> HashMap<String, AttributeValue> {
        let keys = TodoKeys::for_todo(id);
        HashMap::from([
            ("PK".to_string(), AttributeValue::S(keys.pk)),
            ("SK".to_string(), AttributeValue::S(keys.sk)),
        ])
    }

    /// 条件付き書き込みが失敗したとき、原因が「無い」のか「他人の」のかを判別する
    async fn classify_condition_failure(&self, id: &TodoId) -> StoreError {
        match self.get(id).await {
            Ok(Some(_)) => StoreError::OwnerMismatch(id.clone()),
            Ok(None) => StoreError::NotFound(id.clone()),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl TodoRepository for DynamoTodoRepository {
    #[instrument(skip(self), fields(todo_id = %id))]
    async fn get(&self, id: &TodoId) -> StoreResult<Option<Todo>> {
        let result = self
            .db
            .client()
            .get_item()
            .table_name(self.db.table_name())
            .set_key(Some(self.key(id)))
            .consistent_read(true)
            .send()
            .await
            .map_err(dynamo_error)?;

        result.item().map(item_to_todo).transpose()
    }

    #[instrument(skip(self), fields(user_id = %owner))]
    async fn list_for_owner(&self, owner: &UserId) -> StoreResult<Vec<Todo>> {
        let mut todos = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let page = self
                .db
                .client()
                .query()
                .table_name(self.db.table_name())
                .index_name(OWNER_INDEX)
                .key_condition_expression("GSI1PK = :owner")
                .expression_attribute_values(
                    ":owner",
                    AttributeValue::S(TodoKeys::owner_partition(owner)),
                )
                .scan_index_forward(true)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(dynamo_error)?;

            for item in page.items() {
                todos.push(item_to_todo(item)?);
            }

            match page.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        debug!(count = todos.len(), "todos listed");
        Ok(todos)
    }

    #[instrument(skip(self, todo), fields(todo_id = %todo.id))]
    async fn create(&self, todo: &Todo) -> StoreResult<()> {
        let result = self
            .db
            .client()
            .put_item()
            .table_name(self.db.table_name())
            .set_item(Some(todo_to_item(todo)))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false) =>
            {
                Err(StoreError::AlreadyExists(todo.id.clone()))
            }
            Err(e) => Err(dynamo_error(e)),
        }
    }

    #[instrument(skip(self), fields(todo_id = %id, user_id = %owner))]
    async fn update_completed(
        &self,
        id: &TodoId,
        owner: &UserId,
        completed: bool,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Todo> {
        let result = self
            .db
            .client()
            .update_item()
            .table_name(self.db.table_name())
            .set_key(Some(self.key(id)))
            .update_expression("SET Completed = :completed, UpdatedAt = :updated_at")
            .condition_expression("attribute_exists(PK) AND OwnerId = :owner")
            .expression_attribute_values(":completed", AttributeValue::Bool(completed))
            .expression_attribute_values(":updated_at", timestamp_value(updated_at))
            .expression_attribute_values(":owner", AttributeValue::S(owner.as_str().to_string()))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result {
            Ok(output) => {
                let item = output
                    .attributes()
                    .ok_or_else(|| StoreError::MalformedItem("UpdateItem returned no attributes".to_string()))?;
                item_to_todo(item)
            }
            Err(e)
                if e.as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false) =>
            {
                Err(self.classify_condition_failure(id).await)
            }
            Err(e) => Err(dynamo_error(e)),
        }
    }

    #[instrument(skip(self), fields(todo_id = %id, user_id = %owner))]
    async fn delete_owned(&self, id: &TodoId, owner: &UserId) -> StoreResult<bool> {
        let result = self
            .db
            .client()
            .delete_item()
            .table_name(self.db.table_name())
            .set_key(Some(self.key(id)))
            .condition_expression("OwnerId = :owner")
            .expression_attribute_values(":owner", AttributeValue::S(owner.as_str().to_string()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output.attributes().is_some()),
            // 存在しない・他人の Todo はどちらも条件不成立になる
            Err(e)
                if e.as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false) =>
            {
                Ok(false)
            }
            Err(e) => Err(dynamo_error(e)),
        }
    }
}
