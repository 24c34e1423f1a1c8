//! # QuantLake Core
//!
//! 시장 데이터 수집 파이프라인의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 파이프라인 전반에서 공유되는 기본 타입을 제공합니다:
//! - 종목(Instrument) 및 자산 유형
//! - 정규화된 OHLCV 레코드 (`CanonicalRecord`)
//! - 타임프레임 정의
//! - 자산 유형 분류기
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
