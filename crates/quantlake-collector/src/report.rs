//! 수집 결과 리포트.

use quantlake_data::IngestError;
use serde::Serialize;
use std::time::Duration;

/// 심볼 하나의 처리 결과
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolOutcome {
    /// 저장 완료
    Success { records: usize },
    /// 조회 성공, 데이터 없음
    NoData,
    /// 정책에 따라 건너뜀 (미등록/비활성/중복 종목)
    Skipped { reason: IngestError },
    /// 실패
    Failed { error: IngestError },
}

impl SymbolOutcome {
    /// 심볼 단위 에러를 결과로 분류합니다.
    pub fn from_error(error: IngestError) -> Self {
        if error.is_skip() {
            SymbolOutcome::Skipped { reason: error }
        } else {
            SymbolOutcome::Failed { error }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SymbolOutcome::Success { .. })
    }
}

/// 심볼별 결과 레코드
#[derive(Debug, Clone, Serialize)]
pub struct SymbolReport {
    pub symbol: String,
    #[serde(flatten)]
    pub outcome: SymbolOutcome,
}

/// 파이프라인 실행 리포트
///
/// 입력 심볼마다 정확히 하나의 결과를 입력 순서대로 담습니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// 심볼별 결과
    pub symbols: Vec<SymbolReport>,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl IngestReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 결과 추가
    pub fn push(&mut self, symbol: impl Into<String>, outcome: SymbolOutcome) {
        self.symbols.push(SymbolReport {
            symbol: symbol.into(),
            outcome,
        });
    }

    /// 심볼 결과 조회
    pub fn outcome(&self, symbol: &str) -> Option<&SymbolOutcome> {
        self.symbols
            .iter()
            .find(|r| r.symbol == symbol)
            .map(|r| &r.outcome)
    }

    pub fn total(&self) -> usize {
        self.symbols.len()
    }

    pub fn success(&self) -> usize {
        self.count(|o| matches!(o, SymbolOutcome::Success { .. }))
    }

    pub fn no_data(&self) -> usize {
        self.count(|o| matches!(o, SymbolOutcome::NoData))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, SymbolOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SymbolOutcome::Failed { .. }))
    }

    /// 저장된 총 레코드 수
    pub fn total_records(&self) -> usize {
        self.symbols
            .iter()
            .map(|r| match r.outcome {
                SymbolOutcome::Success { records } => records,
                _ => 0,
            })
            .sum()
    }

    /// 실패한 심볼이 있는지 확인
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&SymbolOutcome) -> bool) -> usize {
        self.symbols.iter().filter(|r| pred(&r.outcome)).count()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            (self.success() as f64 / self.total() as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total(),
            success = self.success(),
            no_data = self.no_data(),
            skipped = self.skipped(),
            failed = self.failed(),
            total_records = self.total_records(),
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );

        for report in &self.symbols {
            if let SymbolOutcome::Failed { error } = &report.outcome {
                tracing::warn!(symbol = %report.symbol, error = %error, "실패 심볼");
            }
        }
    }
}
