//! Todo のライフサイクル（作成・完了切り替え・削除・一覧）
//!
//! すべての操作は呼び出し元の `UserId` を明示的に受け取る。

pub mod clock;
pub mod commands;
pub mod controller;
pub mod queries;
pub mod responses;

pub use clock::*;
pub use commands::*;
pub use controller::*;
pub use domain::TodoError;
pub use queries::*;
pub use responses::*;
