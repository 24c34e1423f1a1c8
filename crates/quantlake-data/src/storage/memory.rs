//! 프로세스 내 시장 데이터 저장소.

use super::MarketStore;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quantlake_core::{collapse_duplicates, CanonicalRecord, Instrument, NewInstrument};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    instruments: Vec<Instrument>,
    quotes: BTreeMap<(i32, DateTime<Utc>), CanonicalRecord>,
    next_id: i32,
}

/// 메모리 저장소.
///
/// `PgMarketStore`와 같은 upsert 의미를 가지며, 배치는 하나의 쓰기 잠금
/// 안에서 반영됩니다.
#[derive(Default)]
pub struct MemoryMarketStore {
    inner: RwLock<Inner>,
}

impl MemoryMarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 종목 활성 상태를 변경합니다.
    pub async fn set_active(&self, instrument_id: i32, active: bool) -> Result<()> {
        let mut inner = self.inner.write().await;
        let instrument = inner
            .instruments
            .iter_mut()
            .find(|i| i.id == instrument_id)
            .ok_or_else(|| {
                IngestError::persistence(format!("unknown instrument id {}", instrument_id))
            })?;
        instrument.is_active = active;
        instrument.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl MarketStore for MemoryMarketStore {
    async fn find_instrument(&self, symbol: &str, exchange: &str) -> Result<Option<Instrument>> {
        let inner = self.inner.read().await;
        Ok(inner
            .instruments
            .iter()
            .find(|i| i.symbol == symbol && i.exchange == exchange)
            .cloned())
    }

    async fn find_instruments_by_symbol(&self, symbol: &str) -> Result<Vec<Instrument>> {
        let inner = self.inner.read().await;
        let mut found: Vec<Instrument> = inner
            .instruments
            .iter()
            .filter(|i| i.symbol == symbol)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.exchange.cmp(&b.exchange));
        Ok(found)
    }

    async fn insert_instrument(&self, new: &NewInstrument) -> Result<Instrument> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .instruments
            .iter()
            .find(|i| i.symbol == new.symbol && i.exchange == new.exchange)
        {
            return Ok(existing.clone());
        }

        inner.next_id += 1;
        let now = Utc::now();
        let instrument = Instrument {
            id: inner.next_id,
            symbol: new.symbol.clone(),
            exchange: new.exchange.clone(),
            asset_class: new.asset_class,
            name: new.name.clone(),
            description: new.description.clone(),
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        inner.instruments.push(instrument.clone());
        Ok(instrument)
    }

    async fn upsert_quotes(
        &self,
        instrument_id: i32,
        records: &[CanonicalRecord],
    ) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut inner = self.inner.write().await;
        if !inner.instruments.iter().any(|i| i.id == instrument_id) {
            return Err(IngestError::persistence(format!(
                "foreign key violation: instrument {} does not exist",
                instrument_id
            )));
        }

        let rows = collapse_duplicates(records);
        let written = rows.len();
        for record in rows {
            inner.quotes.insert((instrument_id, record.time), record);
        }
        Ok(written)
    }

    async fn count_quotes(&self, instrument_id: i32) -> Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .quotes
            .keys()
            .filter(|(id, _)| *id == instrument_id)
            .count() as i64)
    }

    async fn quotes_in_range(
        &self,
        instrument_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CanonicalRecord>> {
        if end < start {
            return Ok(Vec::new());
        }
        let inner = self.inner.read().await;
        Ok(inner
            .quotes
            .range((instrument_id, start)..=(instrument_id, end))
            .map(|(_, record)| record.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use quantlake_core::AssetClass;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn record(hour: i64, close: Decimal) -> CanonicalRecord {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let time = t0 + Duration::hours(hour);
        CanonicalRecord::new(time, close, close, close, close, dec!(1)).unwrap()
    }

    #[tokio::test]
    async fn test_insert_instrument_is_idempotent() {
        let store = MemoryMarketStore::new();
        let new = NewInstrument::new("AAPL", "YAHOO", AssetClass::Stock, "Stock AAPL");

        let first = store.insert_instrument(&new).await.unwrap();
        let second = store.insert_instrument(&new).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.find_instruments_by_symbol("AAPL").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing_rows() {
        let store = MemoryMarketStore::new();
        let inst = store
            .insert_instrument(&NewInstrument::crypto("BTC/USDT", "BINANCE"))
            .await
            .unwrap();

        store
            .upsert_quotes(inst.id, &[record(0, dec!(100)), record(1, dec!(101))])
            .await
            .unwrap();
        store
            .upsert_quotes(inst.id, &[record(1, dec!(111)), record(2, dec!(102))])
            .await
            .unwrap();

        assert_eq!(store.count_quotes(inst.id).await.unwrap(), 3);
        let stored = store
            .quotes_in_range(inst.id, record(1, dec!(0)).time, record(1, dec!(0)).time)
            .await
            .unwrap();
        assert_eq!(stored[0].close, dec!(111));
    }

    #[tokio::test]
    async fn test_duplicate_keys_in_batch_last_wins() {
        let store = MemoryMarketStore::new();
        let inst = store
            .insert_instrument(&NewInstrument::crypto("BTC/USDT", "BINANCE"))
            .await
            .unwrap();

        let written = store
            .upsert_quotes(inst.id, &[record(0, dec!(1)), record(0, dec!(2))])
            .await
            .unwrap();

        assert_eq!(written, 1);
        let stored = store
            .quotes_in_range(inst.id, record(0, dec!(0)).time, record(5, dec!(0)).time)
            .await
            .unwrap();
        assert_eq!(stored[0].close, dec!(2));
    }

    #[tokio::test]
    async fn test_unknown_instrument_rejected() {
        let store = MemoryMarketStore::new();
        let err = store.upsert_quotes(42, &[record(0, dec!(1))]).await.unwrap_err();
        assert!(matches!(err, IngestError::PersistenceFailed { .. }));
        assert_eq!(store.upsert_quotes(42, &[]).await.unwrap(), 0);
    }
}
