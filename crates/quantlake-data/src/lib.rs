//! 시장 데이터 수집, 종목 해석, 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 데이터 소스별 어댑터 (암호화폐 페이지네이션, 주식 정규화)
//! - Binance REST / Yahoo Finance 업스트림 클라이언트
//! - 종목 해석기 (자동 생성 / 사전 등록 정책)
//! - 멱등 upsert 저장소 (PostgreSQL, 인메모리)

pub mod error;
pub mod provider;
pub mod resolver;
pub mod storage;

pub use error::{IngestError, Result, SourceError};
pub use provider::{
    BarSource, BinanceCandleSource, BinanceConfig, CandleSource, CryptoOhlcvProvider,
    EquityOhlcvProvider, OhlcvProvider, RawBarRow, RawCandle, RawCell, YahooBarSource,
};
pub use resolver::{InstrumentResolver, ResolvePolicy};
pub use storage::{DatabaseConfig, MarketStore, MemoryMarketStore, PgMarketStore};
