//! 메모리 기반 체결 저장소 (테스트 및 dry-run용).

use super::TradeStore;
use crate::analytics::{aggregate_candles, CandleInterval};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use etl_core::{Candle, TradeRecord};
use std::sync::{Mutex, MutexGuard};

/// 추가 순서를 보존하는 메모리 저장소.
#[derive(Debug, Default)]
pub struct MemoryTradeStore {
    rows: Mutex<Vec<TradeRecord>>,
}

impl MemoryTradeStore {
    /// 빈 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 기존 행을 가진 저장소 생성.
    pub fn with_rows(rows: Vec<TradeRecord>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    /// 저장된 모든 행의 복사본 (추가 순서).
    pub fn rows(&self) -> Vec<TradeRecord> {
        self.lock().clone()
    }

    /// 저장된 행 수.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// 비어 있는지 여부.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TradeRecord>> {
        // 다른 스레드의 panic으로 poison 되어도 데이터는 유효
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TradeStore for MemoryTradeStore {
    async fn latest_trade_id(&self) -> Result<Option<i64>> {
        Ok(self.lock().iter().map(|t| t.trade_id).max())
    }

    async fn append(&self, trades: &[TradeRecord]) -> Result<usize> {
        self.lock().extend_from_slice(trades);
        Ok(trades.len())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<TradeRecord>> {
        let mut rows = self.rows();
        rows.sort_by(|a, b| b.trade_id.cmp(&a.trade_id));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn candles(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>> {
        Ok(aggregate_candles(&self.lock(), start, end, interval))
    }
}
