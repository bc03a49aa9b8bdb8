use crate::errors::DomainError;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use std::ops::RangeInclusive;

/// 期限として受け付ける年（UTC）
const SUPPORTED_YEARS: RangeInclusive<i32> = 0..=9999;

/// 暦日の境界を計算するための固定オフセット付きカレンダー
///
/// 期限のバケット分けは「どのタイムゾーンの 1 日か」に依存するため、
/// オフセットは設定値として明示的に渡す。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

/// `[start, end)` の半開区間で表した 1 暦日
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

impl Calendar {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn from_offset_minutes(minutes: i32) -> Result<Self, DomainError> {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(DomainError::InvalidUtcOffset(minutes))?;
        Ok(Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// 指定時刻がこのカレンダー上で属する日付
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// 指定日の 0 時（このカレンダー上）を UTC で返す
    ///
    /// 表現可能な範囲を外れる日付は範囲の端に丸める。
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.checked_start_of_day(date).unwrap_or(if date.year() < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
    }

    fn checked_start_of_day(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let local_midnight = date.and_time(NaiveTime::MIN);
        local_midnight
            .checked_sub_signed(Duration::seconds(i64::from(self.offset.local_minus_utc())))
            .map(|utc| DateTime::from_naive_utc_and_offset(utc, Utc))
    }

    pub fn day_window(&self, date: NaiveDate) -> DayWindow {
        let start = self.start_of_day(date);
        let end = date
            .succ_opt()
            .map(|next| self.start_of_day(next))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        DayWindow { start, end }
    }

    /// 期限の文字列を UTC の時刻に変換する
    ///
    /// RFC 3339 の日時（`2024-05-01T09:30:00.000Z`）と、日付のみ（`2024-05-01`）を受け付ける。
    /// 日付のみの場合はこのカレンダー上のその日の 0 時とみなす。
    /// UTC に直した年が 0000〜9999 に収まらないものは拒否する（RFC 3339 で書き戻せないため）。
    pub fn parse_due_date(&self, raw: &str) -> Result<DateTime<Utc>, DomainError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DomainError::InvalidDueDate(
                "Due date cannot be empty".to_string(),
            ));
        }

        let instant = match DateTime::parse_from_rfc3339(raw) {
            Ok(instant) => Some(instant.with_timezone(&Utc)),
            Err(_) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| DomainError::InvalidDueDate(raw.to_string()))
                .map(|date| self.checked_start_of_day(date))?,
        };

        instant
            .filter(|instant| SUPPORTED_YEARS.contains(&instant.year()))
            .ok_or_else(|| DomainError::InvalidDueDate(format!("{raw} is out of range")))
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}
