//! 거래소 trait 정의.

use async_trait::async_trait;
use etl_core::AggTrade;

use crate::ExchangeError;

/// 거래소 작업을 위한 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// 한 페이지 요청의 시작 위치.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCursor {
    /// 이 시각(epoch 밀리초) 이후의 체결부터 (`startTime`)
    StartTime(i64),
    /// 이 ID 이상의 체결부터 (`fromId`)
    FromId(i64),
}

/// 집계 체결을 페이지 단위로 제공하는 데이터 소스.
///
/// 각 페이지는 `a` 오름차순으로 정렬되어 있어야 합니다.
#[async_trait]
pub trait AggTradeSource: Send + Sync {
    /// 커서 위치부터 최대 `limit`개의 집계 체결을 조회합니다.
    async fn fetch_page(
        &self,
        symbol: &str,
        cursor: PageCursor,
        limit: u32,
    ) -> ExchangeResult<Vec<AggTrade>>;
}
