//! todo-api バイナリのエントリポイント
//! 設定に応じたストアを組み立て、HTTP サーバを起動します。

use anyhow::Context;
use infrastructure::{DynamoDbClient, DynamoTodoRepository, InMemoryTodoRepository, TodoRepository};
use shared::{init_tracing, Config, StorageBackend};
use std::sync::Arc;
use todo_api::{app_with_state, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    init_tracing().map_err(|e| anyhow::anyhow!(e))?;

    let repo = build_repository(&config).await?;
    let addr = config.socket_addr();
    info!(
        environment = %config.environment,
        storage = ?config.storage_backend,
        %addr,
        "server starting"
    );

    let state = AppState::with_repository(repo, config).context("failed to build app state")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app_with_state(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn build_repository(config: &Config) -> anyhow::Result<Arc<dyn TodoRepository>> {
    match config.storage_backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryTodoRepository::new())),
        StorageBackend::DynamoDb => {
            let db = DynamoDbClient::new(config).await;
            // ローカルの DynamoDB ではテーブルを自動作成する
            if config.dynamodb_endpoint.is_some() {
                db.ensure_table()
                    .await
                    .context("failed to prepare DynamoDB table")?;
            }
            Ok(Arc::new(DynamoTodoRepository::new(db)))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
