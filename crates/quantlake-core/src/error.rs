//! 도메인 모델의 에러 타입.

use thiserror::Error;

/// 레코드 검증 에러.
///
/// 데이터 소스가 반환한 값이 정규화 레코드의 계약을 위반할 때 발생합니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// 필수 필드 누락
    #[error("필수 필드 누락: {0}")]
    MissingField(&'static str),

    /// 음수 값
    #[error("음수 값: {field} = {value}")]
    Negative { field: &'static str, value: String },

    /// 유한하지 않은 값 (NaN, Infinity)
    #[error("유한하지 않은 값: {0}")]
    NonFinite(&'static str),

    /// 표현할 수 없는 타임스탬프
    #[error("잘못된 타임스탬프: {0}")]
    InvalidTimestamp(String),
}

/// 알 수 없는 자산 유형 토큰.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("알 수 없는 자산 유형: {0}")]
pub struct UnknownAssetClass(pub String);
