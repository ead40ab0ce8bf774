//! 집계 체결 페이지네이션 추출.
//!
//! 첫 요청만 `startTime`(커서가 없을 때) 또는 `fromId`로 보내고, 이후 요청은
//! 항상 직전 페이지 마지막 체결의 `a + 1`을 `fromId`로 사용합니다. 같은
//! 밀리초에 여러 체결이 있을 때 시간 기반 재개는 페이지 경계에서 체결을
//! 잃거나 중복시키므로, 시간 기반 요청은 최대 한 번만 허용됩니다.
//!
//! 종료 조건:
//! - 마지막 페이지의 마지막 체결 시각이 `end_time` 이상
//! - 빈 페이지 수신 (더 이상 데이터 없음)
//!
//! 페이지 조회 중 에러가 나면 누적된 결과를 버리고 에러를 그대로 반환합니다.

use crate::traits::{AggTradeSource, ExchangeResult, PageCursor};
use crate::ExchangeError;
use chrono::Utc;
use etl_core::AggTrade;
use tracing::{debug, info};

/// 요청당 최대 체결 수 (API 한도).
pub const AGG_TRADES_PAGE_LIMIT: u32 = 1000;

/// 추출 요청.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    /// 거래쌍 (예: "BTCUSDT")
    pub symbol: String,
    /// 시작 시각 (epoch 밀리초, `trade_id`가 없을 때만 사용)
    pub start_time: i64,
    /// 재개할 집계 체결 ID (있으면 첫 요청부터 `fromId`)
    pub trade_id: Option<i64>,
    /// 종료 경계 (epoch 밀리초, 기본값: 호출 시점의 현재 시각)
    pub end_time: Option<i64>,
}

impl ExtractRequest {
    /// 시작 시각 기준 요청을 생성합니다.
    pub fn new(symbol: impl Into<String>, start_time: i64) -> Self {
        Self {
            symbol: symbol.into(),
            start_time,
            trade_id: None,
            end_time: None,
        }
    }

    /// 재개 커서를 설정합니다.
    pub fn with_trade_id(mut self, trade_id: Option<i64>) -> Self {
        self.trade_id = trade_id;
        self
    }

    /// 종료 경계를 설정합니다.
    pub fn with_end_time(mut self, end_time: i64) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// 첫 요청의 커서.
    pub fn first_cursor(&self) -> PageCursor {
        match self.trade_id {
            Some(id) => PageCursor::FromId(id),
            None => PageCursor::StartTime(self.start_time),
        }
    }
}

/// 종료 조건을 만족할 때까지 페이지를 이어 받아 하나의 목록으로 반환합니다.
///
/// 반환되는 체결은 페이지 수신 순서를 그대로 유지합니다.
pub async fn extract<S>(source: &S, request: &ExtractRequest) -> ExchangeResult<Vec<AggTrade>>
where
    S: AggTradeSource + ?Sized,
{
    if request.symbol.trim().is_empty() {
        return Err(ExchangeError::InvalidRequest(
            "symbol은 비어 있을 수 없습니다".to_string(),
        ));
    }

    let end_time = request
        .end_time
        .unwrap_or_else(|| Utc::now().timestamp_millis());
    let mut cursor = request.first_cursor();
    let mut trades: Vec<AggTrade> = Vec::new();
    let mut pages = 0usize;

    info!(
        symbol = %request.symbol,
        cursor = ?cursor,
        end_time = end_time,
        "집계 체결 추출 시작"
    );

    loop {
        let page = source
            .fetch_page(&request.symbol, cursor, AGG_TRADES_PAGE_LIMIT)
            .await?;
        pages += 1;

        let Some(last) = page.last() else {
            info!(
                symbol = %request.symbol,
                cursor = ?cursor,
                "빈 페이지 수신, 더 이상 데이터 없음"
            );
            break;
        };

        let last_time = last.trade_time;
        let last_id = last.agg_trade_id;
        let next_id = last_id.checked_add(1).ok_or_else(|| {
            ExchangeError::ParseError(format!("aggregate trade id overflow: {}", last_id))
        })?;

        if let PageCursor::FromId(from_id) = cursor {
            if next_id <= from_id {
                return Err(ExchangeError::CursorStalled { from_id, last_id });
            }
        }

        debug!(
            page = pages,
            records = page.len(),
            last_time = last_time,
            next_id = next_id,
            "페이지 수신"
        );

        trades.extend(page);

        if last_time >= end_time {
            break;
        }
        cursor = PageCursor::FromId(next_id);
    }

    info!(
        symbol = %request.symbol,
        pages = pages,
        records = trades.len(),
        "집계 체결 추출 완료"
    );

    Ok(trades)
}
