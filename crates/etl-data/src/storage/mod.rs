//! 체결 저장소.
//!
//! `trades` 관계에 대한 최소 인터페이스를 정의합니다: 추가(append),
//! 최대 `trade_id` 조회, 최근 행 조회, 캔들 집계. 저장소는 고유성을 강제하지
//! 않으며 중복 방지는 변환 단계와 커서 재개가 담당합니다.

pub mod memory;
pub mod postgres;

use crate::analytics::CandleInterval;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use etl_core::{Candle, TradeRecord};

pub use memory::MemoryTradeStore;
pub use postgres::{Database, PgTradeStore, TradeRow};

/// 체결 저장소 인터페이스.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// 저장된 가장 큰 `trade_id` (비어 있으면 `None`).
    async fn latest_trade_id(&self) -> Result<Option<i64>>;

    /// 행을 그대로 추가합니다. 기존 행은 변경하지 않습니다.
    ///
    /// 전부 추가되거나 하나도 추가되지 않아야 합니다.
    async fn append(&self, trades: &[TradeRecord]) -> Result<usize>;

    /// `trade_id` 내림차순으로 최근 행을 조회합니다.
    async fn recent(&self, limit: usize) -> Result<Vec<TradeRecord>>;

    /// `[start, end]` 구간의 캔들을 조회합니다.
    async fn candles(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>>;
}
