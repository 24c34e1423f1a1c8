//! 파일 + 환경변수 기반 설정 모듈.
//!
//! 우선순위: 기본값 < ETL 설정 파일 (YAML/TOML) < `QUANTLAKE__*` 환경변수 < `DATABASE_URL`.

use crate::error::{CollectorError, Result};
use quantlake_core::{AssetClass, Timeframe};
use quantlake_data::{BinanceConfig, DatabaseConfig};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 기본 ETL 설정 파일 경로
pub const DEFAULT_CONFIG_PATH: &str = "configs/etl_config.yaml";

/// 환경변수 접두사 (`QUANTLAKE__CRYPTO__PAGE_LIMIT=500` 형태)
const ENV_PREFIX: &str = "QUANTLAKE";

/// Collector 전체 설정
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectorConfig {
    /// 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 암호화폐 파이프라인 설정
    #[serde(default)]
    pub crypto: CryptoPipelineConfig,
    /// 주식 파이프라인 설정
    #[serde(default)]
    pub equities: EquityPipelineConfig,
    /// 오케스트레이터 공통 설정
    #[serde(default)]
    pub ingest: IngestConfig,
    /// 사전 등록 종목 목록
    #[serde(default)]
    pub seeds: Vec<SeedEntry>,
}

/// 암호화폐 파이프라인 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CryptoPipelineConfig {
    /// 종목 등록 시 사용할 거래소 태그
    pub exchange: String,
    /// Binance REST 기본 URL
    pub base_url: String,
    /// 페이지당 캔들 수
    pub page_limit: usize,
    /// 페이지 요청 간 딜레이 (밀리초)
    pub page_delay_ms: u64,
    /// HTTP 타임아웃 (초)
    pub timeout_secs: u64,
    /// 기본 수집 심볼
    pub symbols: Vec<String>,
    /// 기본 간격
    pub interval: String,
    /// 기본 조회 기간 (일)
    pub lookback_days: i64,
}

impl Default for CryptoPipelineConfig {
    fn default() -> Self {
        Self {
            exchange: "BINANCE".to_string(),
            base_url: BinanceConfig::default().base_url,
            page_limit: 1000,
            page_delay_ms: 0,
            timeout_secs: 30,
            symbols: vec!["BTC/USDT".to_string()],
            interval: "1h".to_string(),
            lookback_days: 30,
        }
    }
}

impl CryptoPipelineConfig {
    /// Binance 소스 설정으로 변환
    pub fn binance(&self) -> BinanceConfig {
        BinanceConfig {
            timeout_secs: self.timeout_secs,
            ..Default::default()
        }
        .with_base_url(&self.base_url)
    }

    /// 페이지 요청 간 딜레이를 Duration으로 반환
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    /// 기본 간격 파싱
    pub fn timeframe(&self) -> Result<Timeframe> {
        parse_interval(&self.interval)
    }
}

/// 주식 파이프라인 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EquityPipelineConfig {
    /// 시드 종목 등록 시 사용할 거래소 태그
    pub exchange: String,
    /// 기본 수집 심볼
    pub symbols: Vec<String>,
    /// 기본 간격
    pub interval: String,
    /// 기본 조회 기간 (일)
    pub lookback_days: i64,
}

impl Default for EquityPipelineConfig {
    fn default() -> Self {
        Self {
            exchange: "YAHOO".to_string(),
            symbols: vec!["SPY".to_string()],
            interval: "1d".to_string(),
            lookback_days: 1,
        }
    }
}

impl EquityPipelineConfig {
    /// 기본 간격 파싱
    pub fn timeframe(&self) -> Result<Timeframe> {
        parse_interval(&self.interval)
    }
}

/// 오케스트레이터 공통 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// 동시에 처리할 심볼 수 (1 = 순차)
    pub concurrency: usize,
    /// 심볼 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            request_delay_ms: 0,
        }
    }
}

impl IngestConfig {
    /// 심볼 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// 사전 등록 종목
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedEntry {
    pub symbol: String,
    pub exchange: String,
    /// 생략 시 심볼 패턴으로 분류
    #[serde(default)]
    pub asset_class: Option<AssetClass>,
    /// 생략 시 심볼
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CollectorConfig {
    /// 설정 로드.
    ///
    /// `path`가 주어지면 해당 파일이 반드시 있어야 하고, 없으면
    /// `configs/etl_config.yaml`을 선택적으로 읽습니다.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_PATH).required(false),
        };

        let mut config = Self::from_builder(config::Config::builder().add_source(file))?;

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }

        Ok(config)
    }

    /// 주어진 소스 위에 환경변수 오버라이드를 적용해 설정을 구성합니다.
    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("crypto.symbols")
                    .with_list_parse_key("equities.symbols"),
            )
            .build()?;

        let parsed: Self = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    fn validate(&self) -> Result<()> {
        if self.crypto.page_limit == 0 {
            return Err(CollectorError::Config(
                "crypto.page_limit은 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.ingest.concurrency == 0 {
            return Err(CollectorError::Config(
                "ingest.concurrency는 1 이상이어야 합니다".to_string(),
            ));
        }
        self.crypto.timeframe()?;
        self.equities.timeframe()?;
        Ok(())
    }
}

fn parse_interval(s: &str) -> Result<Timeframe> {
    s.parse::<Timeframe>()
        .map_err(|_| CollectorError::Config(format!("알 수 없는 간격: {}", s)))
}
