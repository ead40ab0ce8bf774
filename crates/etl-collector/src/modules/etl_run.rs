//! 단일 ETL 실행.
//!
//! 저장소의 `MAX(trade_id)`가 있으면 `fromId = max + 1`로 재개하고(lookback 무시),
//! 없으면 `now - lookback_hours`부터 시작합니다. 추출, 변환, 적재는 순서대로
//! 실행되며 어느 단계든 실패하면 그 자리에서 중단되고 아무것도 적재되지 않습니다.

use crate::{CollectorError, Result, RunReport};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use etl_core::{transform, ConfigError, EtlConfig};
use etl_data::{load, TradeStore};
use etl_exchange::{extract, AggTradeSource, ExtractRequest};
use std::fmt;
use std::time::{Duration, Instant};

/// 실행 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Extracting,
    Transforming,
    Loading,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Extracting => "extracting",
            RunState::Transforming => "transforming",
            RunState::Loading => "loading",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 상태 전이를 기록합니다.
#[derive(Debug)]
struct RunTracker {
    state: RunState,
}

impl RunTracker {
    fn new() -> Self {
        Self {
            state: RunState::Idle,
        }
    }

    fn advance(&mut self, next: RunState) {
        tracing::debug!(from = %self.state, to = %next, "상태 전이");
        self.state = next;
    }

    fn fail(&mut self, err: &CollectorError) {
        tracing::error!(
            state = %self.state,
            error = %err.chain(),
            "ETL 실행 실패"
        );
        self.state = RunState::Failed;
    }
}

/// 현재 시각 기준으로 한 번 실행합니다.
pub async fn run_once<S, T>(source: &S, store: &T, config: &EtlConfig) -> Result<RunReport>
where
    S: AggTradeSource + ?Sized,
    T: TradeStore + ?Sized,
{
    run_once_at(source, store, config, Utc::now()).await
}

/// `now`를 추출 종료 경계로 사용해 한 번 실행합니다.
pub async fn run_once_at<S, T>(
    source: &S,
    store: &T,
    config: &EtlConfig,
    now: DateTime<Utc>,
) -> Result<RunReport>
where
    S: AggTradeSource + ?Sized,
    T: TradeStore + ?Sized,
{
    let started = Instant::now();
    let mut tracker = RunTracker::new();

    tracing::info!(symbol = %config.symbol, end_time = %now, "ETL 실행 시작");

    match execute(&mut tracker, source, store, config, now).await {
        Ok(mut report) => {
            report.elapsed = started.elapsed();
            tracker.advance(RunState::Done);
            report.log_summary(&config.symbol);
            Ok(report)
        }
        Err(e) => {
            tracker.fail(&e);
            Err(e)
        }
    }
}

async fn execute<S, T>(
    tracker: &mut RunTracker,
    source: &S,
    store: &T,
    config: &EtlConfig,
    now: DateTime<Utc>,
) -> Result<RunReport>
where
    S: AggTradeSource + ?Sized,
    T: TradeStore + ?Sized,
{
    tracker.advance(RunState::Extracting);
    let latest = store.latest_trade_id().await?;
    let request = build_request(&config.symbol, latest, now, config.lookback())?;
    let start = request.first_cursor();

    tracing::info!(cursor = ?start, latest_trade_id = ?latest, "추출 시작 위치 결정");

    let raw = extract(source, &request).await?;

    tracker.advance(RunState::Transforming);
    let records = transform(&raw);

    tracker.advance(RunState::Loading);
    let loaded = load(&records, store).await?;

    Ok(RunReport {
        start,
        fetched: raw.len(),
        transformed: records.len(),
        duplicates_dropped: raw.len() - records.len(),
        loaded,
        elapsed: Duration::ZERO,
    })
}

fn build_request(
    symbol: &str,
    latest: Option<i64>,
    now: DateTime<Utc>,
    lookback: ChronoDuration,
) -> Result<ExtractRequest> {
    let end_time = now.timestamp_millis();

    let request = match latest {
        // 커서가 있으면 lookback은 쓰지 않음
        Some(id) => {
            ExtractRequest::new(symbol, end_time).with_trade_id(Some(id.saturating_add(1)))
        }
        None => {
            let start = now
                .checked_sub_signed(lookback)
                .ok_or_else(|| ConfigError::Invalid {
                    key: "lookback_hours".to_string(),
                    reason: format!(
                        "{}부터 {}시간 전은 표현할 수 없습니다",
                        now,
                        lookback.num_hours()
                    ),
                })?;
            ExtractRequest::new(symbol, start.timestamp_millis())
        }
    };

    Ok(request.with_end_time(end_time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use etl_core::{AggTrade, OrderType, TradeRecord};
    use etl_data::{DataError, MemoryTradeStore};
    use etl_exchange::{ExchangeError, ExchangeResult, PageCursor};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct StubSource {
        pages: Mutex<VecDeque<ExchangeResult<Vec<AggTrade>>>>,
        cursors: Mutex<Vec<PageCursor>>,
    }

    impl StubSource {
        fn new(pages: Vec<ExchangeResult<Vec<AggTrade>>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                cursors: Mutex::new(Vec::new()),
            }
        }

        fn cursors(&self) -> Vec<PageCursor> {
            self.cursors.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AggTradeSource for StubSource {
        async fn fetch_page(
            &self,
            _symbol: &str,
            cursor: PageCursor,
            _limit: u32,
        ) -> ExchangeResult<Vec<AggTrade>> {
            self.cursors.lock().unwrap().push(cursor);
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl TradeStore for BrokenStore {
        async fn latest_trade_id(&self) -> etl_data::Result<Option<i64>> {
            Ok(None)
        }

        async fn append(&self, _trades: &[TradeRecord]) -> etl_data::Result<usize> {
            Err(DataError::InsertError("connection reset".to_string()))
        }

        async fn recent(&self, _limit: usize) -> etl_data::Result<Vec<TradeRecord>> {
            Ok(Vec::new())
        }

        async fn candles(
            &self,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
            _interval: etl_data::CandleInterval,
        ) -> etl_data::Result<Vec<etl_core::Candle>> {
            Ok(Vec::new())
        }
    }

    fn config() -> EtlConfig {
        EtlConfig::from_toml_str(
            r#"
            symbol = "BTCUSDT"
            lookback_hours = 24

            [database]
            url = "postgres://localhost/etl"
            "#,
        )
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
    }

    fn trade(id: i64, time: i64, buyer_maker: bool) -> AggTrade {
        AggTrade::new(id, "40000.0", "0.001", time, buyer_maker)
    }

    fn stored(id: i64) -> TradeRecord {
        TradeRecord {
            trade_id: id,
            price: Some(1.0),
            quantity: Some(1.0),
            quote_qty: Some(1.0),
            time: None,
            order_type: OrderType::Buy,
        }
    }

    #[tokio::test]
    async fn test_empty_store_starts_from_lookback() {
        let end = now().timestamp_millis();
        let source = StubSource::new(vec![Ok(vec![
            trade(1, end - 2000, false),
            trade(2, end, true),
        ])]);
        let store = MemoryTradeStore::new();

        let report = run_once_at(&source, &store, &config(), now()).await.unwrap();

        let expected_start = (now() - ChronoDuration::hours(24)).timestamp_millis();
        assert_eq!(source.cursors(), vec![PageCursor::StartTime(expected_start)]);
        assert_eq!(report.start, PageCursor::StartTime(expected_start));
        assert_eq!(report.fetched, 2);
        assert_eq!(report.loaded, 2);

        let rows = store.rows();
        assert_eq!(rows[0].order_type, OrderType::Buy);
        assert_eq!(rows[1].order_type, OrderType::Sell);
    }

    #[tokio::test]
    async fn test_resumes_from_max_trade_id() {
        let end = now().timestamp_millis();
        let source = StubSource::new(vec![Ok(vec![trade(501, end, false)])]);
        let store = MemoryTradeStore::with_rows(vec![stored(499), stored(500)]);

        let report = run_once_at(&source, &store, &config(), now()).await.unwrap();

        assert_eq!(source.cursors(), vec![PageCursor::FromId(501)]);
        assert_eq!(report.start, PageCursor::FromId(501));
        assert_eq!(store.latest_trade_id().await.unwrap(), Some(501));
    }

    #[tokio::test]
    async fn test_duplicates_are_counted_and_dropped() {
        let end = now().timestamp_millis();
        let source = StubSource::new(vec![Ok(vec![
            trade(26129, end - 1, true),
            trade(26130, end - 1, true),
            trade(26130, end, false),
        ])]);
        let store = MemoryTradeStore::new();

        let report = run_once_at(&source, &store, &config(), now()).await.unwrap();

        assert_eq!(report.fetched, 3);
        assert_eq!(report.transformed, 2);
        assert_eq!(report.duplicates_dropped, 1);
        assert_eq!(report.loaded, 2);
        assert_eq!(store.rows()[1].order_type, OrderType::Sell);
    }

    #[tokio::test]
    async fn test_extract_failure_loads_nothing() {
        let end = now().timestamp_millis();
        let source = StubSource::new(vec![
            Ok(vec![trade(1, end - 5000, false)]),
            Err(ExchangeError::RateLimited("HTTP 429".to_string())),
        ]);
        let store = MemoryTradeStore::new();

        let err = run_once_at(&source, &store, &config(), now())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CollectorError::Exchange(ExchangeError::RateLimited(_))
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_surfaced() {
        let end = now().timestamp_millis();
        let source = StubSource::new(vec![Ok(vec![trade(1, end, false)])]);

        let err = run_once_at(&source, &BrokenStore, &config(), now())
            .await
            .unwrap_err();

        assert!(matches!(err, CollectorError::Data(DataError::InsertError(_))));
    }

    #[tokio::test]
    async fn test_second_run_does_not_duplicate() {
        let end = now().timestamp_millis();
        let store = MemoryTradeStore::new();

        let first = StubSource::new(vec![Ok(vec![trade(1, end - 10, false), trade(2, end, false)])]);
        run_once_at(&first, &store, &config(), now()).await.unwrap();

        // 새 체결이 없으면 빈 페이지
        let second = StubSource::new(vec![Ok(Vec::new())]);
        let report = run_once_at(&second, &store, &config(), now()).await.unwrap();

        assert_eq!(second.cursors(), vec![PageCursor::FromId(3)]);
        assert_eq!(report.loaded, 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_build_request_ignores_lookback_when_resuming() {
        let request =
            build_request("BTCUSDT", Some(500), now(), ChronoDuration::hours(24)).unwrap();

        assert_eq!(request.first_cursor(), PageCursor::FromId(501));
        assert_eq!(request.end_time, Some(now().timestamp_millis()));
    }

    #[tokio::test]
    async fn test_unrepresentable_lookback_fails_run() {
        let source = StubSource::new(Vec::new());
        let store = MemoryTradeStore::new();
        let mut config = config();
        config.lookback_hours = 4_000_000_000;

        let err = run_once_at(&source, &store, &config, now())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CollectorError::Config(ConfigError::Invalid { ref key, .. }) if key == "lookback_hours"
        ));
        assert!(source.cursors().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_resume_ignores_unrepresentable_lookback() {
        let end = now().timestamp_millis();
        let source = StubSource::new(vec![Ok(vec![trade(501, end, false)])]);
        let store = MemoryTradeStore::with_rows(vec![stored(500)]);
        let mut config = config();
        config.lookback_hours = 4_000_000_000;

        let report = run_once_at(&source, &store, &config, now()).await.unwrap();

        assert_eq!(report.start, PageCursor::FromId(501));
        assert_eq!(report.loaded, 1);
    }

    #[test]
    fn test_tracker_transitions() {
        let mut tracker = RunTracker::new();
        assert_eq!(tracker.state, RunState::Idle);

        tracker.advance(RunState::Extracting);
        tracker.fail(&CollectorError::from(ExchangeError::Timeout("30s".to_string())));
        assert_eq!(tracker.state, RunState::Failed);
    }
}
