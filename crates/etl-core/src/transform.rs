//! 원본 집계 체결을 저장용 행으로 정규화.
//!
//! 변환은 순수 함수입니다. I/O나 외부 상태 없이 같은 입력에 대해 항상
//! 같은 출력을 돌려줍니다.
//!
//! - `p`, `q`는 부동소수로 파싱하고, 파싱할 수 없으면 `None`으로 둡니다 (행은 유지)
//! - `m`이 `true`면 `Sell`, `false`면 `Buy`
//! - `quote_qty = price × quantity` (어느 한쪽이 `None`이면 `None`)
//! - `T`는 epoch 밀리초로 해석
//! - 같은 `trade_id`가 여러 번 나오면 입력 순서상 첫 번째 것만 남깁니다

use crate::domain::{AggTrade, OrderType, TradeRecord};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// 원본 체결 목록을 정규화하고 `trade_id` 기준으로 중복을 제거합니다.
pub fn transform(raw: &[AggTrade]) -> Vec<TradeRecord> {
    let mut seen = HashSet::with_capacity(raw.len());

    raw.iter()
        .filter(|trade| seen.insert(trade.agg_trade_id))
        .map(normalize)
        .collect()
}

/// 체결 하나를 정규화합니다 (중복 제거 없음).
pub fn normalize(trade: &AggTrade) -> TradeRecord {
    let price = parse_numeric(&trade.price);
    let quantity = parse_numeric(&trade.quantity);

    TradeRecord {
        trade_id: trade.agg_trade_id,
        price,
        quantity,
        quote_qty: price.zip(quantity).map(|(p, q)| p * q),
        time: millis_to_datetime(trade.trade_time),
        order_type: OrderType::from_buyer_maker(trade.is_buyer_maker),
    }
}

/// 숫자 문자열 파싱. 잘못된 입력과 NaN은 `None`.
fn parse_numeric(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// epoch 밀리초를 UTC 시각으로 변환. 표현 범위를 벗어나면 `None`.
pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}
