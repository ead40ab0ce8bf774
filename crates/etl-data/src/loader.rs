//! 정규화된 체결 적재.
//!
//! 적재는 추가 전용입니다. 테이블을 생성하거나 덮어쓰지 않고, 기존 행을
//! 수정하거나 삭제하지 않으며, 존재 여부도 확인하지 않습니다. 실행 간
//! 중복 방지는 다음 실행이 올바른 커서(`MAX(trade_id) + 1`)에서 재개하는
//! 것에 전적으로 의존합니다.

use crate::error::Result;
use crate::storage::TradeStore;
use etl_core::TradeRecord;
use tracing::{debug, info};

/// 체결 목록을 저장소에 추가하고 기록된 행 수를 반환합니다.
///
/// 빈 입력은 저장소에 접근하지 않고 0을 반환합니다.
pub async fn load<S>(trades: &[TradeRecord], store: &S) -> Result<usize>
where
    S: TradeStore + ?Sized,
{
    if trades.is_empty() {
        debug!("적재할 체결 없음");
        return Ok(0);
    }

    let written = store.append(trades).await?;

    info!(
        rows = written,
        first_trade_id = trades.first().map(|t| t.trade_id),
        last_trade_id = trades.last().map(|t| t.trade_id),
        "체결 적재 완료"
    );

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTradeStore;
    use chrono::{DateTime, Utc};
    use etl_core::OrderType;

    fn sample() -> Vec<TradeRecord> {
        vec![
            TradeRecord {
                trade_id: 12345,
                price: Some(40000.0),
                quantity: Some(0.001),
                quote_qty: Some(40.0),
                time: DateTime::<Utc>::from_timestamp_millis(1609459200000),
                order_type: OrderType::Buy,
            },
            TradeRecord {
                trade_id: 12346,
                price: Some(40010.0),
                quantity: Some(0.002),
                quote_qty: Some(80.02),
                time: DateTime::<Utc>::from_timestamp_millis(1609459260000),
                order_type: OrderType::Sell,
            },
        ]
    }

    #[tokio::test]
    async fn test_load_into_empty_store() {
        let store = MemoryTradeStore::new();
        let trades = sample();

        let written = load(&trades, &store).await.unwrap();

        assert_eq!(written, 2);
        assert_eq!(store.rows(), trades);
    }

    #[tokio::test]
    async fn test_load_appends_without_touching_existing_rows() {
        let existing = TradeRecord {
            trade_id: 1,
            price: None,
            quantity: Some(1.0),
            quote_qty: None,
            time: None,
            order_type: OrderType::Sell,
        };
        let store = MemoryTradeStore::with_rows(vec![existing.clone()]);
        let trades = sample();

        let written = load(&trades, &store).await.unwrap();

        assert_eq!(written, trades.len());
        let rows = store.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], existing);
        assert_eq!(&rows[1..], trades.as_slice());
    }

    #[tokio::test]
    async fn test_load_does_not_deduplicate() {
        let store = MemoryTradeStore::new();
        let trades = sample();

        load(&trades, &store).await.unwrap();
        load(&trades, &store).await.unwrap();

        assert_eq!(store.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_input_is_noop() {
        let store = MemoryTradeStore::new();

        assert_eq!(load(&[], &store).await.unwrap(), 0);
        assert!(store.is_empty());
    }
}
