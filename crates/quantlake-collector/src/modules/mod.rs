//! 데이터 수집 모듈.

pub mod instrument_seed;
pub mod ohlcv_ingest;

pub use instrument_seed::{planned_instruments, seed_instruments, SeedSummary};
pub use ohlcv_ingest::{determine_window, IngestOptions, IngestionOrchestrator};
