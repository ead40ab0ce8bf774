//! 실행 결과 요약.

use etl_exchange::PageCursor;
use std::time::Duration;

/// 한 번의 ETL 실행 결과.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// 첫 요청의 커서 (`startTime` 또는 `fromId`)
    pub start: PageCursor,
    /// 추출된 원본 체결 수
    pub fetched: usize,
    /// 변환 후 체결 수
    pub transformed: usize,
    /// 중복으로 제거된 체결 수
    pub duplicates_dropped: usize,
    /// 저장소에 기록된 행 수
    pub loaded: usize,
    /// 소요 시간
    pub elapsed: Duration,
}

impl RunReport {
    /// 요약 로그 출력
    pub fn log_summary(&self, symbol: &str) {
        let (start_kind, start_value) = match self.start {
            PageCursor::StartTime(ms) => ("startTime", ms),
            PageCursor::FromId(id) => ("fromId", id),
        };

        tracing::info!(
            symbol = symbol,
            start = start_kind,
            start_value = start_value,
            fetched = self.fetched,
            transformed = self.transformed,
            duplicates_dropped = self.duplicates_dropped,
            loaded = self.loaded,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "ETL 실행 완료"
        );
    }
}
