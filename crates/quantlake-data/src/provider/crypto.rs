//! 페이지네이션 기반 암호화폐 OHLCV Provider.
//!
//! 거래소 API는 요청당 최대 `limit`개의 캔들만 반환하므로, 마지막 캔들의
//! 타임스탬프 + 1ms를 다음 커서로 사용해 구간 전체를 순회합니다.

use super::OhlcvProvider;
use crate::error::{IngestError, Result, SourceError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quantlake_core::{normalize_window, utc_from_millis, CanonicalRecord, Timeframe};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// 거래소가 페이지당 반환하는 기본 최대 캔들 수 (Binance 기준)
pub const DEFAULT_PAGE_LIMIT: usize = 1000;

/// 거래소에서 받은 원시 캔들.
///
/// 가격/거래량이 `None`이면 거래소 응답에서 해당 값을 해석할 수 없었던 경우입니다.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCandle {
    /// 캔들 시작 시각 (에포크 밀리초)
    pub timestamp_ms: i64,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<Decimal>,
}

/// 한 페이지 단위로 캔들을 조회하는 거래소 소스.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// 소스 이름 (로깅용).
    fn name(&self) -> &str;

    /// `since_ms` 이후(포함) 캔들을 최대 `limit`개 조회합니다.
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        since_ms: Option<i64>,
        limit: usize,
    ) -> std::result::Result<Vec<RawCandle>, SourceError>;
}

/// 페이지네이션 암호화폐 Provider.
pub struct CryptoOhlcvProvider<C> {
    source: C,
    page_limit: usize,
    page_delay: Duration,
}

impl<C: CandleSource> CryptoOhlcvProvider<C> {
    /// 기본 페이지 크기로 Provider를 생성합니다.
    pub fn new(source: C) -> Self {
        Self {
            source,
            page_limit: DEFAULT_PAGE_LIMIT,
            page_delay: Duration::ZERO,
        }
    }

    /// 페이지 크기를 설정합니다 (최소 1).
    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    /// 페이지 요청 사이 대기 시간을 설정합니다 (Rate Limit 대응).
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn page_limit(&self) -> usize {
        self.page_limit
    }

    /// 구간 전체를 페이지 단위로 순회하며 원시 캔들을 모읍니다.
    async fn fetch_pages(
        &self,
        symbol: &str,
        interval: &str,
        start_ms: i64,
        end_ms: Option<i64>,
    ) -> Result<Vec<RawCandle>> {
        let mut collected: Vec<RawCandle> = Vec::new();
        let mut cursor = start_ms;
        let mut page = 0usize;

        loop {
            page += 1;
            let candles = self
                .source
                .fetch_candles(symbol, interval, Some(cursor), self.page_limit)
                .await
                .map_err(|e| IngestError::ProviderFetchFailed {
                    symbol: symbol.to_string(),
                    interval: interval.to_string(),
                    message: e.to_string(),
                })?;

            let Some(last_ts) = candles.last().map(|c| c.timestamp_ms) else {
                debug!(symbol, page, "빈 페이지, 수집 종료");
                break;
            };
            let page_len = candles.len();
            collected.extend(candles);

            debug!(symbol, page, count = page_len, last_ts, "페이지 수신");

            if end_ms.is_some_and(|end| last_ts >= end) {
                break;
            }
            if page_len < self.page_limit {
                break;
            }

            let next = last_ts + 1;
            if next <= cursor {
                warn!(
                    symbol,
                    cursor, last_ts, "커서가 전진하지 않음, 페이지네이션 중단"
                );
                break;
            }
            cursor = next;

            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        Ok(collected)
    }
}

#[async_trait]
impl<C: CandleSource> OhlcvProvider for CryptoOhlcvProvider<C> {
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
        let interval = timeframe.to_binance_interval();
        let start_ms = start.timestamp_millis();
        let end_ms = end.map(|e| e.timestamp_millis());
        let raw = self.fetch_pages(symbol, interval, start_ms, end_ms).await?;

        let validation = |reason: String| IngestError::ValidationFailed {
            symbol: symbol.to_string(),
            reason,
        };

        // 구간 밖 캔들은 검증 대상이 아님
        let in_window = |ts: i64| ts >= start_ms && end_ms.map_or(true, |end| ts <= end);

        let mut records = Vec::with_capacity(raw.len());
        for candle in raw.into_iter().filter(|c| in_window(c.timestamp_ms)) {
            let time =
                utc_from_millis(candle.timestamp_ms).map_err(|e| validation(e.to_string()))?;
            let record = CanonicalRecord::from_parts(
                time,
                candle.open,
                candle.high,
                candle.low,
                candle.close,
                candle.volume,
            )
            .map_err(|e| validation(format!("{} @ {}", e, time)))?;
            records.push(record);
        }

        let records = normalize_window(records, start, end);
        debug!(symbol, count = records.len(), "암호화폐 OHLCV 정규화 완료");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    const HOUR_MS: i64 = 3_600_000;

    /// 고정된 캔들 목록에서 `since` 이후를 `limit`개씩 잘라 반환하는 소스.
    struct VecSource {
        candles: Vec<RawCandle>,
        calls: Mutex<Vec<Option<i64>>>,
        fail: bool,
    }

    impl VecSource {
        fn hourly(start_ms: i64, count: usize) -> Self {
            let candles = (0..count)
                .map(|i| candle(start_ms + i as i64 * HOUR_MS, Decimal::from(i as i64)))
                .collect();
            Self {
                candles,
                calls: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    fn candle(ts: i64, close: Decimal) -> RawCandle {
        RawCandle {
            timestamp_ms: ts,
            open: Some(close),
            high: Some(close),
            low: Some(close),
            close: Some(close),
            volume: Some(dec!(1)),
        }
    }

    #[async_trait]
    impl CandleSource for VecSource {
        fn name(&self) -> &str {
            "stub"
        }

        async fn fetch_candles(
            &self,
            _symbol: &str,
            _interval: &str,
            since_ms: Option<i64>,
            limit: usize,
        ) -> std::result::Result<Vec<RawCandle>, SourceError> {
            self.calls.lock().unwrap().push(since_ms);
            if self.fail {
                return Err(SourceError::Network("connection reset".to_string()));
            }
            let since = since_ms.unwrap_or(i64::MIN);
            Ok(self
                .candles
                .iter()
                .filter(|c| c.timestamp_ms >= since)
                .take(limit)
                .cloned()
                .collect())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_paginates_until_short_page() {
        let start = t0();
        let source = VecSource::hourly(start.timestamp_millis(), 2500);
        let provider = CryptoOhlcvProvider::new(source);

        let records = provider
            .fetch_ohlcv("BTC/USDT", Timeframe::H1, start, None)
            .await
            .unwrap();

        assert_eq!(records.len(), 2500);
        assert_eq!(provider.source.call_count(), 3);
        assert!(records.windows(2).all(|w| w[0].time < w[1].time));
        assert_eq!(records[0].time, start);
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_trailing_empty_page() {
        let start = t0();
        let source = VecSource::hourly(start.timestamp_millis(), 2000);
        let provider = CryptoOhlcvProvider::new(source);

        let records = provider
            .fetch_ohlcv("BTC/USDT", Timeframe::H1, start, None)
            .await
            .unwrap();

        assert_eq!(records.len(), 2000);
        assert_eq!(provider.source.call_count(), 3);
    }

    #[tokio::test]
    async fn test_stops_at_end_bound() {
        let start = t0();
        let source = VecSource::hourly(start.timestamp_millis(), 5000);
        let provider = CryptoOhlcvProvider::new(source).with_page_limit(100);
        let end = start + chrono::Duration::hours(149);

        let records = provider
            .fetch_ohlcv("ETH/USDT", Timeframe::H1, start, Some(end))
            .await
            .unwrap();

        assert_eq!(records.len(), 150);
        assert_eq!(records.last().unwrap().time, end);
        assert_eq!(provider.source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_source_returns_empty() {
        let provider = CryptoOhlcvProvider::new(VecSource::hourly(0, 0));

        let records = provider
            .fetch_ohlcv("BTC/USDT", Timeframe::H1, t0(), None)
            .await
            .unwrap();

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_source_error_maps_to_fetch_failed() {
        let mut source = VecSource::hourly(t0().timestamp_millis(), 10);
        source.fail = true;
        let provider = CryptoOhlcvProvider::new(source);

        let err = provider
            .fetch_ohlcv("BTC/USDT", Timeframe::H1, t0(), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IngestError::ProviderFetchFailed { ref interval, .. } if interval == "1h"
        ));
    }

    #[tokio::test]
    async fn test_missing_close_is_validation_failure() {
        let start = t0();
        let mut source = VecSource::hourly(start.timestamp_millis(), 3);
        source.candles[1].close = None;
        let provider = CryptoOhlcvProvider::new(source);

        let err = provider
            .fetch_ohlcv("BTC/USDT", Timeframe::H1, start, None)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn test_malformed_candle_outside_window_is_ignored() {
        let start = t0();
        let mut source = VecSource::hourly(start.timestamp_millis(), 200);
        // 마지막 페이지가 종료 시각을 넘어서 가져온 캔들
        source.candles[180].close = None;
        let provider = CryptoOhlcvProvider::new(source).with_page_limit(100);
        let end = start + chrono::Duration::hours(149);

        let records = provider
            .fetch_ohlcv("ETH/USDT", Timeframe::H1, start, Some(end))
            .await
            .unwrap();

        assert_eq!(records.len(), 150);
        assert_eq!(records.last().unwrap().time, end);
    }

    /// 커서와 무관하게 항상 같은 꽉 찬 페이지를 돌려주는 소스.
    struct StuckSource {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl CandleSource for StuckSource {
        fn name(&self) -> &str {
            "stuck"
        }

        async fn fetch_candles(
            &self,
            _symbol: &str,
            _interval: &str,
            _since_ms: Option<i64>,
            limit: usize,
        ) -> std::result::Result<Vec<RawCandle>, SourceError> {
            *self.calls.lock().unwrap() += 1;
            let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap().timestamp_millis();
            Ok((0..limit)
                .map(|i| candle(base + i as i64, dec!(1)))
                .collect())
        }
    }

    #[tokio::test]
    async fn test_non_advancing_cursor_stops() {
        let provider = CryptoOhlcvProvider::new(StuckSource {
            calls: Mutex::new(0),
        })
        .with_page_limit(10);

        let records = provider
            .fetch_ohlcv("BTC/USDT", Timeframe::M1, t0(), None)
            .await
            .unwrap();

        assert!(records.is_empty());
        assert_eq!(*provider.source.calls.lock().unwrap(), 1);
    }
}
