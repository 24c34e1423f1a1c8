//! 수집 파이프라인 오류 타입.

use serde::Serialize;
use thiserror::Error;

/// 업스트림 데이터 소스(HTTP API, 라이브러리) 오류.
///
/// 어댑터는 이 오류를 `IngestError::ProviderFetchFailed`로 감싸서 반환합니다.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// 네트워크/연결 오류
    #[error("Network error: {0}")]
    Network(String),

    /// 요청 한도 초과
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// 인증/권한 오류
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// API 오류 코드
    #[error("API error {code}: {message}")]
    Api { code: i32, message: String },

    /// 응답 파싱 오류
    #[error("Parse error: {0}")]
    Parse(String),

    /// 지원하지 않는 요청 (예: 제공하지 않는 간격)
    #[error("Not supported: {0}")]
    Unsupported(String),
}

/// 심볼 단위 수집 오류.
///
/// 오케스트레이터는 심볼마다 이 오류를 잡아 결과 레코드로 변환합니다.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestError {
    /// 데이터 소스 호출 실패 (해당 심볼은 실패 처리, 자동 재시도 없음)
    #[error("Provider fetch failed for {symbol} ({interval}): {message}")]
    ProviderFetchFailed {
        symbol: String,
        interval: String,
        message: String,
    },

    /// 데이터 소스가 필수 필드가 빠진/잘못된 레코드를 반환함
    #[error("Validation failed for {symbol}: {reason}")]
    ValidationFailed { symbol: String, reason: String },

    /// 사전 등록되지 않은 종목
    #[error("Instrument not registered: {symbol}")]
    InstrumentNotRegistered { symbol: String },

    /// 비활성 종목
    #[error("Instrument inactive: {symbol}")]
    InstrumentInactive { symbol: String },

    /// 같은 심볼이 여러 거래소에 등록되어 하나로 결정할 수 없음
    #[error("Instrument ambiguous: {symbol} is registered on {exchanges:?}")]
    InstrumentAmbiguous {
        symbol: String,
        exchanges: Vec<String>,
    },

    /// 문법적으로 잘못된 심볼
    #[error("Invalid symbol: {symbol:?}")]
    InvalidSymbol { symbol: String },

    /// 저장소 쓰기/읽기 실패
    #[error("Persistence failed: {message}")]
    PersistenceFailed { message: String },
}

impl IngestError {
    /// 정책에 따른 건너뛰기인지 확인합니다 (실패가 아님).
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            IngestError::InstrumentNotRegistered { .. }
                | IngestError::InstrumentInactive { .. }
                | IngestError::InstrumentAmbiguous { .. }
        )
    }

    pub(crate) fn persistence(message: impl Into<String>) -> Self {
        IngestError::PersistenceFailed {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for IngestError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => IngestError::persistence("connection pool exhausted"),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().unwrap_or_default();
                IngestError::persistence(format!("[{}] {}", code, db_err.message()))
            }
            other => IngestError::persistence(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
