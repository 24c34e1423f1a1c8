//! 캔들스틱 데이터를 위한 타임프레임 정의.
//!
//! 수집 요청의 간격 토큰(`"1h"`, `"1d"` 등)을 닫힌 열거형으로 표현하고,
//! 각 데이터 소스가 요구하는 간격 문자열로 변환합니다.

use std::fmt;
use std::str::FromStr;

/// 캔들스틱 타임프레임.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    /// 1분봉
    M1,
    /// 3분봉
    M3,
    /// 5분봉
    M5,
    /// 15분봉
    M15,
    /// 30분봉
    M30,
    /// 1시간봉
    H1,
    /// 2시간봉
    H2,
    /// 4시간봉
    H4,
    /// 6시간봉
    H6,
    /// 8시간봉
    H8,
    /// 12시간봉
    H12,
    /// 일봉
    D1,
    /// 3일봉
    D3,
    /// 주봉
    W1,
    /// 월봉
    MN1,
}

impl Timeframe {
    /// 바이낸스 간격 문자열로 변환합니다.
    pub fn to_binance_interval(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M3 => "3m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H4 => "4h",
            Timeframe::H6 => "6h",
            Timeframe::H8 => "8h",
            Timeframe::H12 => "12h",
            Timeframe::D1 => "1d",
            Timeframe::D3 => "3d",
            Timeframe::W1 => "1w",
            Timeframe::MN1 => "1M",
        }
    }

    /// Yahoo Finance 간격 문자열로 변환합니다.
    ///
    /// Yahoo가 제공하지 않는 간격(3분, 2~12시간, 3일)은 `None`을 반환합니다.
    pub fn to_yahoo_interval(&self) -> Option<&'static str> {
        match self {
            Timeframe::M1 => Some("1m"),
            Timeframe::M5 => Some("5m"),
            Timeframe::M15 => Some("15m"),
            Timeframe::M30 => Some("30m"),
            Timeframe::H1 => Some("1h"),
            Timeframe::D1 => Some("1d"),
            Timeframe::W1 => Some("1wk"),
            Timeframe::MN1 => Some("1mo"),
            Timeframe::M3
            | Timeframe::H2
            | Timeframe::H4
            | Timeframe::H6
            | Timeframe::H8
            | Timeframe::H12
            | Timeframe::D3 => None,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_binance_interval())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    /// 바이낸스 표기와 Yahoo 표기(`60m`, `1wk`, `1mo`)를 모두 받습니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let timeframe = match s {
            "1m" => Timeframe::M1,
            "3m" => Timeframe::M3,
            "5m" => Timeframe::M5,
            "15m" => Timeframe::M15,
            "30m" => Timeframe::M30,
            "1h" | "60m" => Timeframe::H1,
            "2h" => Timeframe::H2,
            "4h" => Timeframe::H4,
            "6h" => Timeframe::H6,
            "8h" => Timeframe::H8,
            "12h" => Timeframe::H12,
            "1d" => Timeframe::D1,
            "3d" => Timeframe::D3,
            "1w" | "1wk" => Timeframe::W1,
            "1M" | "1mo" => Timeframe::MN1,
            _ => return Err(format!("Invalid timeframe: {}", s)),
        };
        Ok(timeframe)
    }
}
