//! 주식/지수/외환 OHLCV Provider.
//!
//! 데이터 소스는 라벨이 붙은 셀의 행(`RawBarRow`)을 반환하고, 이 모듈이
//! 라벨 매핑, 타임스탬프 UTC 변환, 거래량 기본값, 구간 잘라내기를 담당합니다.

use super::OhlcvProvider;
use crate::error::{IngestError, Result, SourceError};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use quantlake_core::{decimal_from_f64, normalize_window, CanonicalRecord, Timeframe};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

/// 원시 셀 값.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    /// 숫자
    Number(f64),
    /// 타임존 정보가 없는 시각 (UTC로 간주)
    Naive(NaiveDateTime),
    /// 타임존이 지정된 시각
    Aware(DateTime<FixedOffset>),
    /// 값 없음
    Null,
}

/// 라벨이 붙은 원시 행.
///
/// 라벨 철자는 소스마다 다릅니다 (`Date`/`Datetime`, `Open`/`open` 등).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBarRow {
    pub cells: Vec<(String, RawCell)>,
}

impl RawBarRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 셀을 추가합니다.
    pub fn with(mut self, label: impl Into<String>, cell: RawCell) -> Self {
        self.cells.push((label.into(), cell));
        self
    }
}

/// 구간 단위로 원시 행을 조회하는 데이터 소스.
#[async_trait]
pub trait BarSource: Send + Sync {
    /// 소스 이름 (로깅용).
    fn name(&self) -> &str;

    async fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> std::result::Result<Vec<RawBarRow>, SourceError>;
}

// ============================================================================
// 라벨 매핑
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Time,
    Open,
    High,
    Low,
    Close,
    Volume,
}

fn field_for(label: &str) -> Option<Field> {
    match label.trim().to_lowercase().as_str() {
        "date" | "datetime" | "timestamp" | "time" => Some(Field::Time),
        "open" => Some(Field::Open),
        "high" => Some(Field::High),
        "low" => Some(Field::Low),
        "close" => Some(Field::Close),
        "volume" => Some(Field::Volume),
        _ => None,
    }
}

/// 필드에 해당하는 첫 번째 non-null 셀을 찾습니다.
fn cell_for(row: &RawBarRow, field: Field) -> Option<&RawCell> {
    row.cells
        .iter()
        .filter(|(label, _)| field_for(label) == Some(field))
        .map(|(_, cell)| cell)
        .find(|cell| !matches!(cell, RawCell::Null))
}

fn to_utc(cell: &RawCell) -> std::result::Result<DateTime<Utc>, String> {
    match cell {
        RawCell::Naive(naive) => Ok(naive.and_utc()),
        RawCell::Aware(aware) => Ok(aware.with_timezone(&Utc)),
        other => Err(format!("timestamp cell is not a date: {:?}", other)),
    }
}

fn to_decimal(
    cell: Option<&RawCell>,
    name: &'static str,
) -> std::result::Result<Option<Decimal>, String> {
    match cell {
        None | Some(RawCell::Null) => Ok(None),
        Some(RawCell::Number(v)) => decimal_from_f64(name, *v).map(Some).map_err(|e| e.to_string()),
        Some(other) => Err(format!("{} cell is not numeric: {:?}", name, other)),
    }
}

/// 원시 행 하나를 정규화합니다.
///
/// 거래량이 없거나 null이면 0으로 채웁니다.
fn normalize_row(row: &RawBarRow) -> std::result::Result<CanonicalRecord, String> {
    let time = cell_for(row, Field::Time)
        .ok_or_else(|| "missing field: time".to_string())
        .and_then(to_utc)?;

    let volume = to_decimal(cell_for(row, Field::Volume), "volume")?.unwrap_or(Decimal::ZERO);

    CanonicalRecord::from_parts(
        time,
        to_decimal(cell_for(row, Field::Open), "open")?,
        to_decimal(cell_for(row, Field::High), "high")?,
        to_decimal(cell_for(row, Field::Low), "low")?,
        to_decimal(cell_for(row, Field::Close), "close")?,
        Some(volume),
    )
    .map_err(|e| format!("{} @ {}", e, time))
}

// ============================================================================
// Provider
// ============================================================================

/// 정규화 기반 주식 Provider.
pub struct EquityOhlcvProvider<B> {
    source: B,
}

impl<B: BarSource> EquityOhlcvProvider<B> {
    pub fn new(source: B) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<B: BarSource> OhlcvProvider for EquityOhlcvProvider<B> {
    fn source_name(&self) -> &str {
        self.source.name()
    }

    #[instrument(skip(self), fields(source = %self.source.name()))]
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<CanonicalRecord>> {
        let end = end.unwrap_or_else(Utc::now);
        if end < start {
            return Ok(Vec::new());
        }

        let rows = self
            .source
            .fetch_bars(symbol, timeframe, start, end)
            .await
            .map_err(|e| IngestError::ProviderFetchFailed {
                symbol: symbol.to_string(),
                interval: timeframe.to_string(),
                message: e.to_string(),
            })?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let record = normalize_row(row).map_err(|reason| IngestError::ValidationFailed {
                symbol: symbol.to_string(),
                reason,
            })?;
            records.push(record);
        }

        let records = normalize_window(records, start, Some(end));
        debug!(
            symbol,
            raw = rows.len(),
            kept = records.len(),
            "주식 OHLCV 정규화 완료"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;

    struct FixedSource(Vec<RawBarRow>);

    #[async_trait]
    impl BarSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch_bars(
            &self,
            _symbol: &str,
            _timeframe: Timeframe,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> std::result::Result<Vec<RawBarRow>, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl BarSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn fetch_bars(
            &self,
            _symbol: &str,
            _timeframe: Timeframe,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> std::result::Result<Vec<RawBarRow>, SourceError> {
            Err(SourceError::Network("timeout".to_string()))
        }
    }

    fn naive(y: i32, m: u32, d: u32) -> RawCell {
        RawCell::Naive(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    fn bar(time_label: &str, time: RawCell, close: f64) -> RawBarRow {
        RawBarRow::new()
            .with(time_label, time)
            .with("Open", RawCell::Number(close))
            .with("High", RawCell::Number(close))
            .with("Low", RawCell::Number(close))
            .with("Close", RawCell::Number(close))
            .with("Volume", RawCell::Number(1000.0))
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_naive_date_treated_as_utc() {
        let provider =
            EquityOhlcvProvider::new(FixedSource(vec![bar("Date", naive(2024, 3, 4), 10.5)]));

        let records = provider
            .fetch_ohlcv("SPY", Timeframe::D1, day(1), Some(day(10)))
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].time, day(4));
        assert_eq!(records[0].close, dec!(10.5));
    }

    #[tokio::test]
    async fn test_aware_timestamp_converted_to_utc() {
        let tz = FixedOffset::east_opt(7 * 3600).unwrap();
        let local = tz.with_ymd_and_hms(2024, 3, 4, 7, 0, 0).unwrap();
        let provider = EquityOhlcvProvider::new(FixedSource(vec![bar(
            "Datetime",
            RawCell::Aware(local),
            1.0,
        )]));

        let records = provider
            .fetch_ohlcv("PTT.BK", Timeframe::H1, day(1), Some(day(10)))
            .await
            .unwrap();

        assert_eq!(records[0].time, day(4));
    }

    #[tokio::test]
    async fn test_missing_volume_defaults_to_zero() {
        let row = RawBarRow::new()
            .with("date", naive(2024, 3, 4))
            .with("open", RawCell::Number(1.0))
            .with("high", RawCell::Number(2.0))
            .with("low", RawCell::Number(0.5))
            .with("close", RawCell::Number(1.5));
        let null_volume = RawBarRow::new()
            .with("Date", naive(2024, 3, 5))
            .with("Open", RawCell::Number(1.0))
            .with("High", RawCell::Number(1.0))
            .with("Low", RawCell::Number(1.0))
            .with("Close", RawCell::Number(1.0))
            .with("Volume", RawCell::Null);
        let with_volume = bar("Date", naive(2024, 3, 6), 1.0).with("volume", RawCell::Null);
        let provider = EquityOhlcvProvider::new(FixedSource(vec![row, null_volume, with_volume]));

        let records = provider
            .fetch_ohlcv("EURUSD=X", Timeframe::D1, day(1), Some(day(10)))
            .await
            .unwrap();

        assert_eq!(records[0].volume, Decimal::ZERO);
        assert_eq!(records[1].volume, Decimal::ZERO);
        assert_eq!(records[2].volume, dec!(1000));
    }

    #[tokio::test]
    async fn test_rows_outside_window_are_dropped() {
        let rows = vec![
            bar("Date", naive(2024, 3, 1), 1.0),
            bar("Date", naive(2024, 3, 5), 5.0),
            bar("Date", naive(2024, 3, 3), 3.0),
            bar("Date", naive(2024, 3, 9), 9.0),
        ];
        let provider = EquityOhlcvProvider::new(FixedSource(rows));

        let records = provider
            .fetch_ohlcv("SPY", Timeframe::D1, day(2), Some(day(5)))
            .await
            .unwrap();

        let times: Vec<_> = records.iter().map(|r| r.time).collect();
        assert_eq!(times, vec![day(3), day(5)]);
    }

    #[tokio::test]
    async fn test_missing_close_fails_validation() {
        let row = RawBarRow::new()
            .with("Date", naive(2024, 3, 4))
            .with("Open", RawCell::Number(1.0))
            .with("High", RawCell::Number(1.0))
            .with("Low", RawCell::Number(1.0));
        let provider = EquityOhlcvProvider::new(FixedSource(vec![row]));

        let err = provider
            .fetch_ohlcv("SPY", Timeframe::D1, day(1), Some(day(10)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IngestError::ValidationFailed { ref reason, .. } if reason.contains("close")
        ));
    }

    #[tokio::test]
    async fn test_nan_price_fails_validation() {
        let provider =
            EquityOhlcvProvider::new(FixedSource(vec![bar("Date", naive(2024, 3, 4), f64::NAN)]));

        let err = provider
            .fetch_ohlcv("SPY", Timeframe::D1, day(1), Some(day(10)))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn test_source_failure() {
        let provider = EquityOhlcvProvider::new(FailingSource);

        let err = provider
            .fetch_ohlcv("SPY", Timeframe::D1, day(1), Some(day(10)))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::ProviderFetchFailed { .. }));
    }

    #[tokio::test]
    async fn test_empty_source() {
        let provider = EquityOhlcvProvider::new(FixedSource(Vec::new()));

        let records = provider
            .fetch_ohlcv("SPY", Timeframe::D1, day(1), Some(day(10)))
            .await
            .unwrap();

        assert!(records.is_empty());
    }
}
