//! Binance Spot 캔들 소스.
//!
//! 공개 엔드포인트 `/api/v3/klines`만 사용하므로 API 키가 필요 없습니다.

use super::crypto::{CandleSource, RawCandle};
use crate::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

// ============================================================================
// 설정
// ============================================================================

/// Binance 소스 설정.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// REST 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl BinanceConfig {
    /// 기본 URL을 변경합니다 (테스트 서버, 미러 등).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

// ============================================================================
// API 응답 타입
// ============================================================================

/// `/api/v3/klines` 응답 한 행.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct BinanceKline(
    i64,    // 0: Open time
    String, // 1: Open
    String, // 2: High
    String, // 3: Low
    String, // 4: Close
    String, // 5: Volume
    i64,    // 6: Close time
    String, // 7: Quote asset volume
    i64,    // 8: Number of trades
    String, // 9: Taker buy base asset volume
    String, // 10: Taker buy quote asset volume
    String, // 11: Ignore
);

#[derive(Debug, Deserialize)]
struct BinanceError {
    code: i32,
    msg: String,
}

// ============================================================================
// 소스
// ============================================================================

/// Binance REST 캔들 소스.
pub struct BinanceCandleSource {
    config: BinanceConfig,
    client: Client,
}

impl BinanceCandleSource {
    /// 새 소스를 생성합니다.
    pub fn new(config: BinanceConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// "BTC/USDT" -> "BTCUSDT"
    fn to_market_id(symbol: &str) -> String {
        symbol.replace('/', "").to_uppercase()
    }

    fn parse_decimal(s: &str) -> Option<Decimal> {
        s.parse::<Decimal>().ok()
    }

    /// API 응답 처리.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, SourceError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse response: {} - Body: {}", e, body);
                SourceError::Parse(e.to_string())
            })
        } else if status.as_u16() == 429 || status.as_u16() == 418 {
            Err(SourceError::RateLimited(body))
        } else if let Ok(error) = serde_json::from_str::<BinanceError>(&body) {
            Err(Self::map_error_code(error.code, &error.msg))
        } else {
            Err(SourceError::Api {
                code: status.as_u16() as i32,
                message: body,
            })
        }
    }

    /// Binance 에러 코드를 SourceError로 매핑.
    fn map_error_code(code: i32, msg: &str) -> SourceError {
        match code {
            -1003 => SourceError::RateLimited(msg.to_string()),
            -1002 | -2014 | -2015 => SourceError::Unauthorized(msg.to_string()),
            _ => SourceError::Api {
                code,
                message: msg.to_string(),
            },
        }
    }
}

#[async_trait]
impl CandleSource for BinanceCandleSource {
    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        since_ms: Option<i64>,
        limit: usize,
    ) -> Result<Vec<RawCandle>, SourceError> {
        let mut params = vec![
            ("symbol", Self::to_market_id(symbol)),
            ("interval", interval.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(since) = since_ms {
            params.push(("startTime", since.to_string()));
        }

        let url = format!("{}/api/v3/klines", self.config.base_url);
        debug!(symbol, interval, ?since_ms, "GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let klines: Vec<BinanceKline> = self.handle_response(response).await?;

        Ok(klines
            .into_iter()
            .map(|k| RawCandle {
                timestamp_ms: k.0,
                open: Self::parse_decimal(&k.1),
                high: Self::parse_decimal(&k.2),
                low: Self::parse_decimal(&k.3),
                close: Self::parse_decimal(&k.4),
                volume: Self::parse_decimal(&k.5),
            })
            .collect())
    }
}
