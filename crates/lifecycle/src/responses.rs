use serde::{Deserialize, Serialize};

/// 削除結果
///
/// 自分の Todo を実際に消した場合のみ `success: true`。
/// 存在しない・他人の・削除済みの Todo はエラーにせず `false` を返す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
}

impl DeleteOutcome {
    pub fn removed() -> Self {
        Self { success: true }
    }

    pub fn nothing_removed() -> Self {
        Self { success: false }
    }
}
