//! 期限によるバケット分け
//!
//! ユーザーの Todo 集合を基準日に対して `overdue` / `dueToday` / `dueLater`
//! の 3 つに分割する。分割は網羅的かつ排他的で、完了済みの Todo もそのまま
//! 期限のバケットに残る。基準日は常に引数で受け取り、内部で時計を読まない。

use crate::calendar::{Calendar, DayWindow};
use crate::todo::Todo;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Overdue,
    DueToday,
    DueLater,
}

/// バケット内の並び順
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketOrder {
    /// 入力（作成）順
    #[default]
    Insertion,
    /// 期限の昇順。同じ期限は入力順を保つ
    DueDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedTodos {
    pub overdue: Vec<Todo>,
    pub due_today: Vec<Todo>,
    pub due_later: Vec<Todo>,
}

impl GroupedTodos {
    pub fn bucket(&self, bucket: Bucket) -> &[Todo] {
        match bucket {
            Bucket::Overdue => &self.overdue,
            Bucket::DueToday => &self.due_today,
            Bucket::DueLater => &self.due_later,
        }
    }

    pub fn len(&self) -> usize {
        self.overdue.len() + self.due_today.len() + self.due_later.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Todo> {
        self.overdue
            .iter()
            .chain(self.due_today.iter())
            .chain(self.due_later.iter())
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<Todo> {
        match bucket {
            Bucket::Overdue => &mut self.overdue,
            Bucket::DueToday => &mut self.due_today,
            Bucket::DueLater => &mut self.due_later,
        }
    }
}

/// 1 つの基準日に対して期限がどのバケットに属するかを返す
pub fn classify(due_date: DateTime<Utc>, today: &DayWindow) -> Bucket {
    if due_date < today.start {
        Bucket::Overdue
    } else if today.contains(due_date) {
        Bucket::DueToday
    } else {
        Bucket::DueLater
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TodoGrouper {
    calendar: Calendar,
}

impl TodoGrouper {
    pub fn new(calendar: Calendar) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn group<I>(&self, todos: I, reference_date: NaiveDate, order: BucketOrder) -> GroupedTodos
    where
        I: IntoIterator<Item = Todo>,
    {
        let today = self.calendar.day_window(reference_date);
        let mut grouped = GroupedTodos::default();

        for todo in todos {
            let bucket = classify(todo.due_date, &today);
            grouped.bucket_mut(bucket).push(todo);
        }

        if order == BucketOrder::DueDate {
            // sort_by_key は安定ソートなので同じ期限は入力順のまま
            for bucket in [Bucket::Overdue, Bucket::DueToday, Bucket::DueLater] {
                grouped.bucket_mut(bucket).sort_by_key(|todo| todo.due_date);
            }
        }

        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::{NewTodo, TodoId};
    use crate::user::UserId;
    use chrono::{Duration, TimeZone};
    use std::collections::HashSet;

    fn reference_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn todo_due(title: &str, due_date: DateTime<Utc>) -> Todo {
        let owner = UserId::from_string("niveditha".to_string()).unwrap();
        let draft = NewTodo::new(title, due_date, false).unwrap();
        Todo::create(draft, owner, Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap())
    }

    fn titles(todos: &[Todo]) -> Vec<&str> {
        todos.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_boundaries_are_half_open() {
        let today = Calendar::utc().day_window(reference_date());

        assert_eq!(classify(today.start - Duration::nanoseconds(1), &today), Bucket::Overdue);
        assert_eq!(classify(today.start, &today), Bucket::DueToday);
        assert_eq!(classify(today.end - Duration::nanoseconds(1), &today), Bucket::DueToday);
        assert_eq!(classify(today.end, &today), Bucket::DueLater);
    }

    #[test]
    fn test_group_splits_into_three_buckets() {
        // Arrange
        let todos = vec![
            todo_due("Pay rent", Utc.with_ymd_and_hms(2024, 4, 28, 10, 0, 0).unwrap()),
            todo_due("Go to gym", Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap()),
            todo_due("File taxes", Utc.with_ymd_and_hms(2024, 5, 20, 9, 0, 0).unwrap()),
            todo_due("Buy fruits", Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
        ];

        // Act
        let grouped = TodoGrouper::default().group(todos, reference_date(), BucketOrder::Insertion);

        // Assert
        assert_eq!(titles(&grouped.overdue), vec!["Pay rent"]);
        assert_eq!(titles(&grouped.due_today), vec!["Go to gym", "Buy fruits"]);
        assert_eq!(titles(&grouped.due_later), vec!["File taxes"]);
        assert_eq!(grouped.len(), 4);
    }

    #[test]
    fn test_completed_todos_stay_in_their_date_bucket() {
        let mut done = todo_due("Submit assignment", Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap());
        done.completed = true;

        let grouped = TodoGrouper::default().group(vec![done], reference_date(), BucketOrder::Insertion);

        assert_eq!(titles(grouped.bucket(Bucket::Overdue)), vec!["Submit assignment"]);
        assert!(grouped.due_today.is_empty());
    }

    #[test]
    fn test_due_date_order_is_stable() {
        let same = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let todos = vec![
            todo_due("late", Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap()),
            todo_due("first-noon", same),
            todo_due("early", Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap()),
            todo_due("second-noon", same),
        ];

        let grouped = TodoGrouper::default().group(todos, reference_date(), BucketOrder::DueDate);

        assert_eq!(
            titles(&grouped.due_today),
            vec!["early", "first-noon", "second-noon", "late"]
        );
    }

    #[test]
    fn test_calendar_offset_changes_bucket() {
        // UTC の 4/30 20:00 は JST では 5/1 05:00
        let due = Utc.with_ymd_and_hms(2024, 4, 30, 20, 0, 0).unwrap();
        let jst = TodoGrouper::new(Calendar::from_offset_minutes(9 * 60).unwrap());

        let in_utc = TodoGrouper::default().group(vec![todo_due("x", due)], reference_date(), BucketOrder::Insertion);
        let in_jst = jst.group(vec![todo_due("x", due)], reference_date(), BucketOrder::Insertion);

        assert_eq!(in_utc.overdue.len(), 1);
        assert_eq!(in_jst.due_today.len(), 1);
    }

    #[test]
    fn test_grouped_todos_serialize_with_wire_names() {
        let grouped = GroupedTodos::default();
        let json = serde_json::to_value(&grouped).unwrap();

        assert!(json["overdue"].is_array());
        assert!(json["dueToday"].is_array());
        assert!(json["dueLater"].is_array());
    }

    // プロパティベーステスト: バケットは排他的かつ網羅的
    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn any_due_offsets() -> impl Strategy<Value = Vec<i64>> {
            // 基準日の前後 5 日程度に散らばる期限（分単位）
            proptest::collection::vec(-7_200i64..7_200, 0..40)
        }

        proptest! {
            #[test]
            fn buckets_form_a_partition(
                offsets in any_due_offsets(),
                day_shift in -3i64..3,
                offset_minutes in -720i32..=840,
                by_due_date in any::<bool>(),
            ) {
                let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
                let todos: Vec<Todo> = offsets
                    .iter()
                    .map(|m| todo_due("t", base + Duration::minutes(*m)))
                    .collect();
                let input_ids: Vec<TodoId> = todos.iter().map(|t| t.id.clone()).collect();

                let calendar = Calendar::from_offset_minutes(offset_minutes).unwrap();
                let reference = reference_date() + Duration::days(day_shift);
                let order = if by_due_date { BucketOrder::DueDate } else { BucketOrder::Insertion };
                let grouped = TodoGrouper::new(calendar).group(todos, reference, order);

                // 網羅性: 件数が一致し、すべての ID が現れる
                prop_assert_eq!(grouped.len(), input_ids.len());
                let output: HashSet<&TodoId> = grouped.iter().map(|t| &t.id).collect();
                prop_assert_eq!(output.len(), input_ids.len());
                for id in &input_ids {
                    prop_assert!(output.contains(id));
                }

                // 排他性: 各 Todo は自身の期限が示すバケットにのみ存在する
                let today = calendar.day_window(reference);
                for bucket in [Bucket::Overdue, Bucket::DueToday, Bucket::DueLater] {
                    for todo in grouped.bucket(bucket) {
                        prop_assert_eq!(classify(todo.due_date, &today), bucket);
                    }
                }
            }
        }
    }
}
