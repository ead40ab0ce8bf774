//! ETL 실행 모듈.

pub mod daemon;
pub mod etl_run;

pub use daemon::run_daemon;
pub use etl_run::{run_once, run_once_at, RunState};
