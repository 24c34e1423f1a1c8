//! 정규화된 OHLCV 레코드.
//!
//! 모든 데이터 소스의 원시 응답은 `CanonicalRecord` 시퀀스로 변환된 뒤 저장됩니다.
//! 타임스탬프는 `DateTime<Utc>`이므로 타임존이 모호한(naive) 값은 표현할 수 없습니다.

use crate::error::RecordError;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 하나의 OHLCV 관측값.
///
/// 같은 종목 안에서 `time`이 레코드의 식별자입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// 캔들 시작 시각 (UTC)
    pub time: DateTime<Utc>,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 거래량
    pub volume: Decimal,
}

impl CanonicalRecord {
    /// 검증된 레코드를 생성합니다.
    ///
    /// 가격과 거래량은 모두 0 이상이어야 합니다.
    pub fn new(
        time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Result<Self, RecordError> {
        for (field, value) in [
            ("open", open),
            ("high", high),
            ("low", low),
            ("close", close),
            ("volume", volume),
        ] {
            if value < Decimal::ZERO {
                return Err(RecordError::Negative {
                    field,
                    value: value.to_string(),
                });
            }
        }

        Ok(Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    /// 필드별 `Option` 값에서 레코드를 생성합니다.
    ///
    /// 하나라도 `None`이면 `MissingField`를 반환합니다.
    pub fn from_parts(
        time: DateTime<Utc>,
        open: Option<Decimal>,
        high: Option<Decimal>,
        low: Option<Decimal>,
        close: Option<Decimal>,
        volume: Option<Decimal>,
    ) -> Result<Self, RecordError> {
        Self::new(
            time,
            open.ok_or(RecordError::MissingField("open"))?,
            high.ok_or(RecordError::MissingField("high"))?,
            low.ok_or(RecordError::MissingField("low"))?,
            close.ok_or(RecordError::MissingField("close"))?,
            volume.ok_or(RecordError::MissingField("volume"))?,
        )
    }
}

/// `f64`를 `Decimal`로 변환합니다 (NaN, Infinity는 에러).
pub fn decimal_from_f64(field: &'static str, value: f64) -> Result<Decimal, RecordError> {
    if !value.is_finite() {
        return Err(RecordError::NonFinite(field));
    }
    Decimal::from_f64(value).ok_or(RecordError::NonFinite(field))
}

/// 에포크 밀리초를 UTC 시각으로 변환합니다.
pub fn utc_from_millis(ms: i64) -> Result<DateTime<Utc>, RecordError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| RecordError::InvalidTimestamp(format!("{} ms", ms)))
}

/// 요청 구간으로 잘라내고, 타임스탬프 중복을 제거한 뒤 오름차순 정렬합니다.
///
/// - `start`, `end` 모두 포함 구간입니다. `end`가 `None`이면 상한이 없습니다.
/// - 중복 타임스탬프는 먼저 나온 레코드를 유지합니다 (페이지 경계 반복 캔들).
pub fn normalize_window(
    records: Vec<CanonicalRecord>,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Vec<CanonicalRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut result: Vec<CanonicalRecord> = records
        .into_iter()
        .filter(|r| r.time >= start && end.map_or(true, |e| r.time <= e))
        .filter(|r| seen.insert(r.time))
        .collect();

    result.sort_by_key(|r| r.time);
    result
}

/// 같은 타임스탬프가 여러 번 나오면 마지막 레코드만 남깁니다.
///
/// 한 배치 안의 중복 키는 `ON CONFLICT DO UPDATE`가 처리하지 못하므로
/// 저장 직전에 적용합니다. 결과는 오름차순 정렬됩니다.
pub fn collapse_duplicates(records: &[CanonicalRecord]) -> Vec<CanonicalRecord> {
    let mut by_time = std::collections::BTreeMap::new();
    for record in records {
        by_time.insert(record.time, record.clone());
    }
    by_time.into_values().collect()
}
