//! 데이터 Provider 모듈.
//!
//! 외부 시장 데이터 소스를 정규화된 `CanonicalRecord` 시퀀스로 변환합니다.
//!
//! ## 암호화폐 (페이지네이션)
//! - `CryptoOhlcvProvider`: 커서 기반 페이지 반복 수집
//! - `BinanceCandleSource`: Binance `/api/v3/klines` REST 소스
//!
//! ## 주식/지수/외환 (정규화)
//! - `EquityOhlcvProvider`: 라벨 기반 원시 행을 정규화
//! - `YahooBarSource`: Yahoo Finance 차트 API 소스

pub mod binance;
pub mod crypto;
pub mod equity;
pub mod yahoo;

pub use binance::{BinanceCandleSource, BinanceConfig};
pub use crypto::{CandleSource, CryptoOhlcvProvider, RawCandle};
pub use equity::{BarSource, EquityOhlcvProvider, RawBarRow, RawCell};
pub use yahoo::YahooBarSource;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quantlake_core::{CanonicalRecord, Timeframe};

/// OHLCV 데이터 Provider trait.
///
/// 구현체는 다음을 보장해야 합니다:
/// - 반환 레코드는 `time` 오름차순이며 중복 타임스탬프가 없음
/// - 모든 레코드가 `[start, end]` 구간 안에 있음 (`end`가 `None`이면 상한 없음)
/// - 데이터가 없으면 빈 벡터 (에러 아님)
#[async_trait]
pub trait OhlcvProvider: Send + Sync {
    /// 데이터 소스 이름 (로깅용).
    fn source_name(&self) -> &str;

    /// 구간 내 OHLCV 레코드를 조회합니다.
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<CanonicalRecord>>;
}
