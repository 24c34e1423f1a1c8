//! Yahoo Finance 바 소스.
//!
//! `yahoo_finance_api` 크레이트의 차트 API를 사용합니다. 응답 타임스탬프는
//! 에포크 초이므로 UTC 시각으로 태깅해 전달합니다.
//!
//! OHLC는 분할/배당 조정 가격(`adjclose / close` 비율 적용)으로 전달하고,
//! 거래량은 원본 그대로 둡니다.

use super::equity::{BarSource, RawBarRow, RawCell};
use crate::error::SourceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quantlake_core::Timeframe;
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api::YahooError;

/// Yahoo Finance 소스.
pub struct YahooBarSource {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooBarSource {
    pub fn new() -> Result<Self, SourceError> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| SourceError::Network(format!("Yahoo Finance 연결 실패: {}", e)))?;
        Ok(Self { connector })
    }
}

/// 구간에 데이터가 없어서 발생한 에러인지 확인합니다.
fn is_empty_window(err: &YahooError) -> bool {
    matches!(err, YahooError::NoResult | YahooError::NoQuotes)
}

/// 조정 종가 비율을 OHLC에 적용합니다.
///
/// 비율을 계산할 수 없으면 (종가 0, 조정 종가 누락) 원본 가격을 그대로 반환합니다.
fn adjust_ohlc(open: f64, high: f64, low: f64, close: f64, adjclose: f64) -> [f64; 4] {
    if close > 0.0 && adjclose.is_finite() && adjclose > 0.0 {
        let factor = adjclose / close;
        [open * factor, high * factor, low * factor, adjclose]
    } else {
        [open, high, low, close]
    }
}

/// chrono UTC 시각 → time::OffsetDateTime 변환.
fn to_offset_datetime(dt: DateTime<Utc>) -> Result<OffsetDateTime, SourceError> {
    OffsetDateTime::from_unix_timestamp(dt.timestamp())
        .map_err(|e| SourceError::Parse(format!("시각 변환 실패 ({}): {}", dt, e)))
}

#[async_trait]
impl BarSource for YahooBarSource {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawBarRow>, SourceError> {
        let interval = timeframe.to_yahoo_interval().ok_or_else(|| {
            SourceError::Unsupported(format!(
                "Yahoo Finance는 {} 간격을 지원하지 않습니다",
                timeframe
            ))
        })?;

        debug!(
            symbol,
            interval,
            start = %start,
            end = %end,
            "Yahoo Finance API 날짜 범위 호출"
        );

        let response = match self
            .connector
            .get_quote_history_interval(
                symbol,
                to_offset_datetime(start)?,
                to_offset_datetime(end)?,
                interval,
            )
            .await
        {
            Ok(response) => response,
            Err(e) if is_empty_window(&e) => {
                debug!(symbol, "Yahoo Finance 구간에 데이터 없음");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(SourceError::Network(format!(
                    "Yahoo Finance API 오류 ({}): {}",
                    symbol, e
                )));
            }
        };

        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            Err(e) if is_empty_window(&e) => return Ok(Vec::new()),
            Err(e) => return Err(SourceError::Parse(format!("Quote 파싱 오류: {}", e))),
        };

        let mut rows = Vec::with_capacity(quotes.len());
        for q in quotes {
            let time = DateTime::from_timestamp(q.timestamp as i64, 0).ok_or_else(|| {
                SourceError::Parse(format!("잘못된 타임스탬프: {}", q.timestamp))
            })?;

            let [open, high, low, close] = adjust_ohlc(q.open, q.high, q.low, q.close, q.adjclose);

            rows.push(
                RawBarRow::new()
                    .with("Date", RawCell::Aware(time.fixed_offset()))
                    .with("Open", RawCell::Number(open))
                    .with("High", RawCell::Number(high))
                    .with("Low", RawCell::Number(low))
                    .with("Close", RawCell::Number(close))
                    .with("Volume", RawCell::Number(q.volume as f64)),
            );
        }

        Ok(rows)
    }
}
