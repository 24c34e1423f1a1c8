//! 종목(Instrument) 및 자산 유형 정의.
//!
//! 종목은 `(symbol, exchange)` 쌍으로 식별되는 거래 가능한 상품입니다.
//! 숫자 `id`는 저장소가 부여하는 대리 키로, 외래 키 참조에만 사용됩니다.

use crate::error::UnknownAssetClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 자산 유형 분류.
///
/// DB에는 대문자 토큰(`CRYPTO`, `STOCK` 등)으로 저장됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetClass {
    /// 암호화폐
    Crypto,
    /// 주식 / ETF
    Stock,
    /// 외환
    Forex,
    /// 원자재 (선물)
    Commodity,
    /// 지수
    Index,
}

impl AssetClass {
    /// DB 저장용 토큰을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Crypto => "CRYPTO",
            AssetClass::Stock => "STOCK",
            AssetClass::Forex => "FOREX",
            AssetClass::Commodity => "COMMODITY",
            AssetClass::Index => "INDEX",
        }
    }

    /// 표시 이름용 토큰 (예: "Stock", "Index").
    pub fn display_label(&self) -> &'static str {
        match self {
            AssetClass::Crypto => "Crypto",
            AssetClass::Stock => "Stock",
            AssetClass::Forex => "Forex",
            AssetClass::Commodity => "Commodity",
            AssetClass::Index => "Index",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = UnknownAssetClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CRYPTO" => Ok(AssetClass::Crypto),
            "STOCK" => Ok(AssetClass::Stock),
            "FOREX" => Ok(AssetClass::Forex),
            "COMMODITY" => Ok(AssetClass::Commodity),
            "INDEX" => Ok(AssetClass::Index),
            _ => Err(UnknownAssetClass(s.to_string())),
        }
    }
}

/// 저장된 종목.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// 저장소가 부여한 ID
    pub id: i32,
    /// 데이터 소스 고유 표기 심볼 (예: "BTC/USDT", "AAPL", "^SET.BK")
    pub symbol: String,
    /// 거래소 / 데이터 소스 태그 (예: "BINANCE", "YAHOO")
    pub exchange: String,
    /// 자산 유형
    pub asset_class: AssetClass,
    /// 표시 이름
    pub name: String,
    /// 설명
    pub description: Option<String>,
    /// 활성 여부
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 신규 종목 등록 요청.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInstrument {
    pub symbol: String,
    pub exchange: String,
    pub asset_class: AssetClass,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

impl NewInstrument {
    /// 활성 상태의 신규 종목을 생성합니다.
    pub fn new(
        symbol: impl Into<String>,
        exchange: impl Into<String>,
        asset_class: AssetClass,
        name: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: exchange.into(),
            asset_class,
            name: name.into(),
            description: None,
            is_active: true,
        }
    }

    /// 설명을 설정합니다.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 자동 생성되는 암호화폐 종목 (예: "Crypto BTC/USDT").
    pub fn crypto(symbol: &str, exchange: &str) -> Self {
        Self::new(symbol, exchange, AssetClass::Crypto, format!("Crypto {}", symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_class_round_trip() {
        for class in [
            AssetClass::Crypto,
            AssetClass::Stock,
            AssetClass::Forex,
            AssetClass::Commodity,
            AssetClass::Index,
        ] {
            assert_eq!(class.as_str().parse::<AssetClass>().unwrap(), class);
        }
        assert_eq!("stock".parse::<AssetClass>().unwrap(), AssetClass::Stock);
        assert!("BOND".parse::<AssetClass>().is_err());
    }

    #[test]
    fn test_new_crypto_instrument() {
        let new = NewInstrument::crypto("ETH/USDT", "BINANCE");
        assert_eq!(new.asset_class, AssetClass::Crypto);
        assert_eq!(new.name, "Crypto ETH/USDT");
        assert!(new.is_active);
    }
}
