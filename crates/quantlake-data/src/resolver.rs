//! 심볼 → 저장된 종목 결정.
//!
//! 파이프라인마다 정책이 다릅니다:
//! - 암호화폐: 없으면 자동 등록 (`Crypto {symbol}`)
//! - 주식 등: 사전 등록된 활성 종목만 허용, 없거나 비활성이면 건너뜀

use crate::error::{IngestError, Result};
use crate::storage::MarketStore;
use quantlake_core::{Instrument, NewInstrument};
use std::sync::Arc;
use tracing::{info, warn};

/// 종목 결정 정책.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvePolicy {
    /// `(symbol, exchange)`로 조회하고 없으면 자동 생성
    Crypto { exchange: String },
    /// 심볼만으로 조회, 미등록/비활성/중복은 건너뜀
    Equities,
}

/// 종목 결정기.
pub struct InstrumentResolver<S> {
    store: Arc<S>,
}

impl<S> Clone for InstrumentResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: MarketStore> InstrumentResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 정책에 따라 종목을 결정합니다.
    ///
    /// 건너뛰어야 하는 경우 `IngestError::is_skip()`이 참인 에러를 반환합니다.
    pub async fn resolve(&self, symbol: &str, policy: &ResolvePolicy) -> Result<Instrument> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(IngestError::InvalidSymbol {
                symbol: symbol.to_string(),
            });
        }

        match policy {
            ResolvePolicy::Crypto { exchange } => {
                if let Some(existing) = self.store.find_instrument(symbol, exchange).await? {
                    return Ok(existing);
                }
                let created = self
                    .store
                    .insert_instrument(&NewInstrument::crypto(symbol, exchange))
                    .await?;
                info!(symbol, exchange = %exchange, id = created.id, "암호화폐 종목 자동 등록");
                Ok(created)
            }
            ResolvePolicy::Equities => {
                let mut found = self.store.find_instruments_by_symbol(symbol).await?;
                match found.len() {
                    0 => {
                        warn!(symbol, "등록되지 않은 종목, 건너뜀");
                        Err(IngestError::InstrumentNotRegistered {
                            symbol: symbol.to_string(),
                        })
                    }
                    1 => {
                        let instrument = found.remove(0);
                        if instrument.is_active {
                            Ok(instrument)
                        } else {
                            warn!(symbol, "비활성 종목, 건너뜀");
                            Err(IngestError::InstrumentInactive {
                                symbol: symbol.to_string(),
                            })
                        }
                    }
                    _ => {
                        let exchanges: Vec<String> =
                            found.into_iter().map(|i| i.exchange).collect();
                        warn!(symbol, ?exchanges, "여러 거래소에 등록된 심볼, 건너뜀");
                        Err(IngestError::InstrumentAmbiguous {
                            symbol: symbol.to_string(),
                            exchanges,
                        })
                    }
                }
            }
        }
    }
}
