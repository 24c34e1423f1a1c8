//! OHLCV 수집 모듈.
//!
//! 심볼마다 종목 결정 → 조회 → 저장을 수행하고, 한 심볼의 실패가 다른
//! 심볼에 영향을 주지 않도록 모든 에러를 심볼 단위 결과로 변환합니다.

use crate::error::{CollectorError, Result};
use crate::report::{IngestReport, SymbolOutcome};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use quantlake_core::{ingest_span, Timeframe};
use quantlake_data::{InstrumentResolver, MarketStore, OhlcvProvider, ResolvePolicy};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// 오케스트레이터 실행 옵션
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// 동시에 처리할 심볼 수 (최소 1)
    pub concurrency: usize,
    /// 심볼 처리 후 대기 시간
    pub request_delay: Duration,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            request_delay: Duration::ZERO,
        }
    }
}

/// 수집 파이프라인 오케스트레이터.
pub struct IngestionOrchestrator<P, S> {
    provider: P,
    store: Arc<S>,
    resolver: InstrumentResolver<S>,
    policy: ResolvePolicy,
    options: IngestOptions,
}

impl<P: OhlcvProvider, S: MarketStore> IngestionOrchestrator<P, S> {
    pub fn new(provider: P, store: Arc<S>, policy: ResolvePolicy) -> Self {
        Self {
            provider,
            resolver: InstrumentResolver::new(Arc::clone(&store)),
            store,
            policy,
            options: IngestOptions::default(),
        }
    }

    /// 실행 옵션을 설정합니다.
    pub fn with_options(mut self, options: IngestOptions) -> Self {
        self.options = IngestOptions {
            concurrency: options.concurrency.max(1),
            ..options
        };
        self
    }

    /// 심볼 목록을 수집합니다.
    ///
    /// 입력 심볼마다 하나의 결과를 입력 순서대로 반환합니다. 이 함수 자체는
    /// 실패하지 않습니다.
    pub async fn run(
        &self,
        symbols: &[String],
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> IngestReport {
        let started = Instant::now();
        let total = symbols.len();

        tracing::info!(
            source = self.provider.source_name(),
            symbols = total,
            interval = %timeframe,
            start = %start,
            end = ?end,
            concurrency = self.options.concurrency,
            "OHLCV 수집 시작"
        );

        let outcomes: Vec<(String, SymbolOutcome)> = stream::iter(symbols.iter().enumerate())
            .map(|(idx, symbol)| async move {
                tracing::debug!(progress = format!("{}/{}", idx + 1, total), "수집 시작");

                let outcome = self.ingest_symbol(symbol, timeframe, start, end).await;

                // Rate limiting
                if !self.options.request_delay.is_zero() && idx + 1 < total {
                    tokio::time::sleep(self.options.request_delay).await;
                }
                (symbol.clone(), outcome)
            }
            .instrument(ingest_span!("ingest_symbol", symbol, timeframe)))
            .buffered(self.options.concurrency)
            .collect()
            .await;

        let mut report = IngestReport::new();
        for (symbol, outcome) in outcomes {
            report.push(symbol, outcome);
        }
        report.elapsed = started.elapsed();
        report
    }

    /// 심볼 하나를 처리합니다.
    async fn ingest_symbol(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> SymbolOutcome {
        let instrument = match self.resolver.resolve(symbol, &self.policy).await {
            Ok(instrument) => instrument,
            Err(e) => {
                let outcome = SymbolOutcome::from_error(e);
                if let SymbolOutcome::Failed { error } = &outcome {
                    tracing::error!(symbol, error = %error, "종목 결정 실패");
                }
                return outcome;
            }
        };

        let records = match self
            .provider
            .fetch_ohlcv(symbol, timeframe, start, end)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(symbol, error = %e, "조회 실패");
                return SymbolOutcome::from_error(e);
            }
        };

        if records.is_empty() {
            tracing::warn!(symbol, "데이터 없음");
            return SymbolOutcome::NoData;
        }

        match self.store.upsert_quotes(instrument.id, &records).await {
            Ok(written) => {
                tracing::info!(
                    symbol,
                    instrument_id = instrument.id,
                    records = written,
                    "수집 및 저장 완료"
                );
                SymbolOutcome::Success { records: written }
            }
            Err(e) => {
                tracing::error!(symbol, error = %e, "저장 실패");
                SymbolOutcome::from_error(e)
            }
        }
    }
}

/// 수집 구간 결정.
///
/// - `start_date`가 있으면 그 날짜 00:00 UTC부터, `end_date`(00:00 UTC) 또는 `now`까지
/// - 없으면 종료 시각(`end_date` 또는 `now`)에서 `days`일 전부터
pub fn determine_window(
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    days: i64,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let midnight = |d: NaiveDate| d.and_hms_opt(0, 0, 0).map(|n| n.and_utc());

    let end = match end_date {
        Some(d) => midnight(d)
            .ok_or_else(|| CollectorError::InvalidArgument(format!("잘못된 종료일: {}", d)))?,
        None => now,
    };

    let start = match start_date {
        Some(d) => midnight(d)
            .ok_or_else(|| CollectorError::InvalidArgument(format!("잘못된 시작일: {}", d)))?,
        None => {
            if days < 0 {
                return Err(CollectorError::InvalidArgument(format!(
                    "조회 기간은 0 이상이어야 합니다: {}",
                    days
                )));
            }
            ChronoDuration::try_days(days)
                .and_then(|span| end.checked_sub_signed(span))
                .ok_or_else(|| {
                    CollectorError::InvalidArgument(format!("조회 기간이 너무 깁니다: {}일", days))
                })?
        }
    };

    if start > end {
        return Err(CollectorError::InvalidArgument(format!(
            "시작 시각({})이 종료 시각({})보다 늦습니다",
            start, end
        )));
    }

    Ok((start, end))
}
