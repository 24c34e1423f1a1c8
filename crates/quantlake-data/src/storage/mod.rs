//! 스토리지 모듈.
//!
//! - `PgMarketStore`: PostgreSQL/TimescaleDB 영구 저장소
//! - `MemoryMarketStore`: 프로세스 내 저장소 (dry-run, 테스트)

pub mod memory;
pub mod postgres;

pub use memory::MemoryMarketStore;
pub use postgres::{DatabaseConfig, PgMarketStore};

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quantlake_core::{CanonicalRecord, Instrument, NewInstrument};

/// 종목 및 시세 저장소.
///
/// 시세는 `(instrument_id, time)`을 키로 하는 upsert로만 기록되므로
/// 같은 배치를 몇 번 반복 저장해도 결과가 같습니다.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// `(symbol, exchange)`로 종목을 조회합니다.
    async fn find_instrument(&self, symbol: &str, exchange: &str) -> Result<Option<Instrument>>;

    /// 심볼이 같은 모든 종목을 조회합니다 (거래소 무관, 정렬: exchange).
    async fn find_instruments_by_symbol(&self, symbol: &str) -> Result<Vec<Instrument>>;

    /// 종목을 등록합니다.
    ///
    /// 이미 `(symbol, exchange)`가 존재하면 기존 종목을 그대로 반환합니다.
    async fn insert_instrument(&self, new: &NewInstrument) -> Result<Instrument>;

    /// 시세를 일괄 upsert합니다.
    ///
    /// 전체 배치가 원자적으로 반영되며, 배치 안의 중복 타임스탬프는
    /// 마지막 레코드가 우선합니다. 반환값은 기록된 고유 행 수입니다.
    async fn upsert_quotes(&self, instrument_id: i32, records: &[CanonicalRecord])
        -> Result<usize>;

    /// 종목의 저장된 시세 수.
    async fn count_quotes(&self, instrument_id: i32) -> Result<i64>;

    /// 구간 `[start, end]`의 시세를 시간 오름차순으로 조회합니다.
    async fn quotes_in_range(
        &self,
        instrument_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CanonicalRecord>>;
}
