//! 집계 체결(aggregate trade) 기록.
//!
//! 이 모듈은 파이프라인 전 구간에서 사용하는 체결 타입을 정의합니다:
//! - `AggTrade` - 거래소 API가 반환하는 원본 집계 체결
//! - `TradeRecord` - 정규화되어 저장소에 적재되는 체결 행
//! - `OrderType` - 공격자(aggressor) 방향

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// `/api/v3/aggTrades` 응답의 원소 하나.
///
/// API가 함께 보내는 `f`, `l`, `M` 필드는 파이프라인에서 쓰지 않으므로 무시합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggTrade {
    /// 집계 체결 ID (심볼별 단조 증가, 재개 커서)
    #[serde(rename = "a")]
    pub agg_trade_id: i64,
    /// 가격 (십진 문자열)
    #[serde(rename = "p")]
    pub price: String,
    /// 수량 (십진 문자열)
    #[serde(rename = "q")]
    pub quantity: String,
    /// 체결 시각 (epoch 밀리초)
    #[serde(rename = "T")]
    pub trade_time: i64,
    /// 매수자가 메이커였는지 여부
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

impl AggTrade {
    /// 새 원본 체결을 생성합니다.
    pub fn new(
        agg_trade_id: i64,
        price: impl Into<String>,
        quantity: impl Into<String>,
        trade_time: i64,
        is_buyer_maker: bool,
    ) -> Self {
        Self {
            agg_trade_id,
            price: price.into(),
            quantity: quantity.into(),
            trade_time,
            is_buyer_maker,
        }
    }
}

/// 체결의 공격자 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// 매수 공격 (매수자가 테이커)
    Buy,
    /// 매도 공격 (매수자가 메이커)
    Sell,
}

impl OrderType {
    /// `m` 플래그에서 방향을 유도합니다.
    pub fn from_buyer_maker(is_buyer_maker: bool) -> Self {
        if is_buyer_maker {
            OrderType::Sell
        } else {
            OrderType::Buy
        }
    }

    /// 저장소에 기록되는 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Buy => "Buy",
            OrderType::Sell => "Sell",
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Buy" => Ok(OrderType::Buy),
            "Sell" => Ok(OrderType::Sell),
            _ => Err(format!("Unknown order type: {}", s)),
        }
    }
}

/// 정규화된 체결 행 (`trades` 테이블의 한 행).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// 집계 체결 ID
    pub trade_id: i64,
    /// 가격 (파싱 실패 시 `None`)
    pub price: Option<f64>,
    /// 수량 (파싱 실패 시 `None`)
    pub quantity: Option<f64>,
    /// 체결 대금 (price × quantity)
    pub quote_qty: Option<f64>,
    /// 체결 시각
    pub time: Option<DateTime<Utc>>,
    /// 공격자 방향
    pub order_type: OrderType,
}

/// 일정 구간의 OHLC 캔들.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 구간 시작 시각 (`date_trunc` 결과)
    pub bucket: DateTime<Utc>,
    /// 구간 내 가장 이른 체결 가격
    pub open: f64,
    /// 최고가
    pub high: f64,
    /// 최저가
    pub low: f64,
    /// 구간 내 가장 늦은 체결 가격
    pub close: f64,
}
