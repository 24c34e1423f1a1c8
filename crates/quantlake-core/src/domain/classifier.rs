//! 심볼 패턴과 데이터 소스로 자산 유형을 판별합니다.

use super::AssetClass;
use tracing::warn;

/// 바이낸스 데이터 소스 태그
pub const SOURCE_BINANCE: &str = "BINANCE";
/// Yahoo Finance 데이터 소스 태그
pub const SOURCE_YAHOO: &str = "YAHOO";

/// 자산 유형 분류.
///
/// - BINANCE: 항상 암호화폐
/// - YAHOO: `^` 접두사는 지수, `=X`는 외환, `=F`는 원자재 선물,
///   `DX-Y`(달러 인덱스)는 외환, 그 외는 주식
/// - 알 수 없는 소스: 주식으로 간주
pub fn classify(symbol: &str, source: &str) -> AssetClass {
    let source = source.to_uppercase();

    if source == SOURCE_BINANCE {
        return AssetClass::Crypto;
    }

    if source == SOURCE_YAHOO {
        let symbol = symbol.to_uppercase();

        if symbol.starts_with('^') {
            return AssetClass::Index;
        }
        if symbol.ends_with("=X") {
            return AssetClass::Forex;
        }
        if symbol.ends_with("=F") {
            return AssetClass::Commodity;
        }
        if symbol.contains("DX-Y") {
            return AssetClass::Forex;
        }
        return AssetClass::Stock;
    }

    warn!(symbol, source = %source, "알 수 없는 데이터 소스, STOCK으로 분류");
    AssetClass::Stock
}
