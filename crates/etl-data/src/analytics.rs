//! 저장된 체결에서 OHLC 캔들 계산.
//!
//! PostgreSQL 저장소는 같은 집계를 `date_trunc` 쿼리로 수행하고,
//! 메모리 저장소는 `aggregate_candles`를 사용합니다.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use etl_core::{Candle, TradeRecord};
use std::collections::BTreeMap;
use std::str::FromStr;

/// 캔들 구간 단위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CandleInterval {
    Second,
    Minute,
    Hour,
    #[default]
    Day,
}

impl CandleInterval {
    /// PostgreSQL `date_trunc`의 필드 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::Second => "second",
            CandleInterval::Minute => "minute",
            CandleInterval::Hour => "hour",
            CandleInterval::Day => "day",
        }
    }

    fn delta(&self) -> TimeDelta {
        match self {
            CandleInterval::Second => TimeDelta::seconds(1),
            CandleInterval::Minute => TimeDelta::minutes(1),
            CandleInterval::Hour => TimeDelta::hours(1),
            CandleInterval::Day => TimeDelta::days(1),
        }
    }

    /// 시각을 구간 시작으로 내림.
    pub fn truncate(&self, time: DateTime<Utc>) -> DateTime<Utc> {
        time.duration_trunc(self.delta()).unwrap_or(time)
    }
}

impl std::fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandleInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "second" => Ok(Self::Second),
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            _ => Err(format!("Unknown candle interval: {}", s)),
        }
    }
}

/// `[start, end]` 구간(양 끝 포함)의 체결을 캔들로 집계합니다.
///
/// 가격이나 시각이 없는 행은 건너뜁니다. 같은 시각의 체결은 `trade_id` 순서로
/// 시가/종가를 정합니다.
pub fn aggregate_candles(
    trades: &[TradeRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: CandleInterval,
) -> Vec<Candle> {
    let mut points: Vec<(DateTime<Utc>, i64, f64)> = trades
        .iter()
        .filter_map(|t| Some((t.time?, t.trade_id, t.price?)))
        .filter(|(time, _, _)| *time >= start && *time <= end)
        .collect();
    points.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut buckets: BTreeMap<DateTime<Utc>, Candle> = BTreeMap::new();
    for (time, _, price) in points {
        let bucket = interval.truncate(time);
        buckets
            .entry(bucket)
            .and_modify(|c| {
                c.high = c.high.max(price);
                c.low = c.low.min(price);
                c.close = price;
            })
            .or_insert(Candle {
                bucket,
                open: price,
                high: price,
                low: price,
                close: price,
            });
    }

    buckets.into_values().collect()
}
