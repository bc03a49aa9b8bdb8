use chrono::NaiveDate;
use domain::BucketOrder;

/// 期限バケット一覧の取得
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListGroupedTodosQuery {
    pub reference_date: NaiveDate,
    pub order: BucketOrder,
}

impl ListGroupedTodosQuery {
    pub fn on(reference_date: NaiveDate) -> Self {
        Self {
            reference_date,
            order: BucketOrder::default(),
        }
    }

    pub fn ordered_by(mut self, order: BucketOrder) -> Self {
        self.order = order;
        self
    }
}
