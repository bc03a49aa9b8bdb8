use crate::todo::Todo;
use crate::user::UserId;

/// 所有者チェックの判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Authorized,
    Forbidden,
}

impl Access {
    pub fn is_authorized(self) -> bool {
        matches!(self, Access::Authorized)
    }
}

/// リクエスト元が対象 Todo の所有者かどうかを判定する
///
/// 純粋な所有者述語であり、存在しない Todo と他人の Todo を区別しない。
/// Forbidden をどう扱うか（エラーにするか、失敗フラグにするか）は呼び出し側が決める。
pub fn check_ownership(requester: &UserId, todo: &Todo) -> Access {
    if todo.is_owned_by(requester) {
        Access::Authorized
    } else {
        Access::Forbidden
    }
}
