//! QuantLake 배치 수집기.
//!
//! 이 crate는 외부 시장 데이터를 정규화해 저장하는 배치 파이프라인을 제공합니다:
//! - 암호화폐 OHLCV 수집 (Binance, 페이지네이션, 종목 자동 등록)
//! - 주식/지수/외환 OHLCV 수집 (Yahoo Finance, 사전 등록 종목만)
//! - 종목 사전 등록 (설정 파일 시드)

pub mod config;
pub mod error;
pub mod modules;
pub mod report;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use modules::{IngestOptions, IngestionOrchestrator};
pub use report::{IngestReport, SymbolOutcome, SymbolReport};
