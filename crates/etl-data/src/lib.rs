//! 체결 데이터 저장 및 조회.
//!
//! 이 crate는 다음을 제공합니다:
//! - `TradeStore` trait과 PostgreSQL/메모리 구현
//! - 추가 전용 적재 (`load`)
//! - 저장된 체결의 OHLC 캔들 집계

pub mod analytics;
pub mod error;
pub mod loader;
pub mod storage;

pub use analytics::{aggregate_candles, CandleInterval};
pub use error::{DataError, Result};
pub use loader::load;
pub use storage::{Database, MemoryTradeStore, PgTradeStore, TradeRow, TradeStore};
