//! 에러 타입 정의.

use quantlake_data::IngestError;
use thiserror::Error;

/// Collector 에러 타입
///
/// 심볼 단위 실패는 리포트에 기록되고 여기까지 올라오지 않습니다.
/// 이 타입은 실행 자체를 중단시키는 오류(설정, 인자, 종목 등록)만 담습니다.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 데이터 계층 에러 (종목 등록)
    #[error("Data error: {0}")]
    Data(#[from] IngestError),

    /// 잘못된 CLI 인자
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<config::ConfigError> for CollectorError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
