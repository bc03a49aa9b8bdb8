use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// トレーシングサブスクライバーを初期化
///
/// 出力は JSON の構造化ログ。`RUST_LOG` が未設定なら `info` 以上を出す。
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).json())
        .with(filter)
        .try_init()?;

    Ok(())
}
