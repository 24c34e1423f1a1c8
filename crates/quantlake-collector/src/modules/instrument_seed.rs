//! 종목 사전 등록 모듈.
//!
//! 설정 파일의 정적 시드와 파이프라인 심볼 목록을 종목 테이블에 등록합니다.
//! 이미 존재하는 `(symbol, exchange)`는 건너뛰므로 반복 실행해도 안전합니다.

use crate::config::CollectorConfig;
use crate::error::Result;
use quantlake_core::{classify, NewInstrument};
use quantlake_data::MarketStore;
use serde::Serialize;
use std::time::Instant;

/// 시드 실행 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    /// 신규 등록 수
    pub registered: usize,
    /// 이미 존재해 건너뛴 수
    pub existing: usize,
}

/// 설정으로부터 등록 대상 종목 목록을 만듭니다.
///
/// 순서: 정적 시드 → 암호화폐 심볼 → 주식 심볼
pub fn planned_instruments(config: &CollectorConfig) -> Vec<NewInstrument> {
    let mut planned = Vec::new();

    for seed in &config.seeds {
        let asset_class = seed
            .asset_class
            .unwrap_or_else(|| classify(&seed.symbol, &seed.exchange));
        let name = seed.name.clone().unwrap_or_else(|| seed.symbol.clone());
        let mut new = NewInstrument::new(&seed.symbol, &seed.exchange, asset_class, name);
        new.description = seed.description.clone();
        planned.push(new);
    }

    for symbol in &config.crypto.symbols {
        planned.push(
            NewInstrument::crypto(symbol, &config.crypto.exchange)
                .with_description("Auto-seeded active trading pair"),
        );
    }

    let exchange = &config.equities.exchange;
    for symbol in &config.equities.symbols {
        let asset_class = classify(symbol, exchange);
        planned.push(
            NewInstrument::new(
                symbol,
                exchange,
                asset_class,
                format!("{} {}", asset_class.display_label(), symbol),
            )
            .with_description("Auto-seeded active trading asset"),
        );
    }

    planned
}

/// 종목 사전 등록
pub async fn seed_instruments<S: MarketStore>(
    store: &S,
    config: &CollectorConfig,
) -> Result<SeedSummary> {
    let start = Instant::now();
    let mut summary = SeedSummary::default();

    tracing::info!("종목 등록 시작");

    for new in planned_instruments(config) {
        if store.find_instrument(&new.symbol, &new.exchange).await?.is_some() {
            tracing::debug!(symbol = %new.symbol, exchange = %new.exchange, "이미 등록된 종목");
            summary.existing += 1;
            continue;
        }

        let instrument = store.insert_instrument(&new).await?;
        tracing::info!(
            symbol = %instrument.symbol,
            exchange = %instrument.exchange,
            asset_class = %instrument.asset_class,
            "신규 종목 등록"
        );
        summary.registered += 1;
    }

    tracing::info!(
        registered = summary.registered,
        existing = summary.existing,
        elapsed = format!("{:.1}s", start.elapsed().as_secs_f64()),
        "종목 등록 완료"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedEntry;
    use quantlake_core::AssetClass;
    use quantlake_data::MemoryMarketStore;

    fn config() -> CollectorConfig {
        let mut config = CollectorConfig::default();
        config.crypto.symbols = vec!["BTC/USDT".to_string(), "ETH/USDT".to_string()];
        config.equities.symbols = vec![
            "^SET.BK".to_string(),
            "EURUSD=X".to_string(),
            "GC=F".to_string(),
            "PTT.BK".to_string(),
        ];
        config.seeds = vec![SeedEntry {
            symbol: "DX-Y.NYB".to_string(),
            exchange: "YAHOO".to_string(),
            asset_class: None,
            name: Some("US Dollar Index".to_string()),
            description: None,
        }];
        config
    }

    #[test]
    fn test_planned_classification_and_names() {
        let planned = planned_instruments(&config());
        let by_symbol = |s: &str| planned.iter().find(|n| n.symbol == s).unwrap().clone();

        assert_eq!(by_symbol("DX-Y.NYB").asset_class, AssetClass::Forex);
        assert_eq!(by_symbol("DX-Y.NYB").name, "US Dollar Index");
        assert_eq!(by_symbol("BTC/USDT").name, "Crypto BTC/USDT");
        assert_eq!(by_symbol("BTC/USDT").exchange, "BINANCE");
        assert_eq!(by_symbol("^SET.BK").name, "Index ^SET.BK");
        assert_eq!(by_symbol("EURUSD=X").asset_class, AssetClass::Forex);
        assert_eq!(by_symbol("GC=F").name, "Commodity GC=F");
        assert_eq!(by_symbol("PTT.BK").name, "Stock PTT.BK");
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = MemoryMarketStore::new();
        let config = config();

        let first = seed_instruments(&store, &config).await.unwrap();
        let second = seed_instruments(&store, &config).await.unwrap();

        assert_eq!(first.registered, 7);
        assert_eq!(first.existing, 0);
        assert_eq!(second.registered, 0);
        assert_eq!(second.existing, 7);
    }
}
