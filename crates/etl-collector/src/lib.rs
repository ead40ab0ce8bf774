//! aggTrade ETL 실행기.
//!
//! 저장된 커서에서 재개하여 거래소의 집계 체결을 추출하고, 정규화한 뒤
//! 저장소에 추가합니다:
//! - 단일 실행 (`run_once`)
//! - 주기 실행 (`run_daemon`)

pub mod error;
pub mod modules;
pub mod stats;

pub use error::{CollectorError, Result};
pub use modules::{run_daemon, run_once, run_once_at, RunState};
pub use stats::RunReport;
