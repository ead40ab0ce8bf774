//! 거래소 연결 및 집계 체결 추출.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - `AggTradeSource` trait: 페이지 단위 집계 체결 조회 인터페이스
//! - Binance REST 커넥터 (`/api/v3/aggTrades`)
//! - 커서 기반 페이지네이션 추출기 (`extract`)

pub mod connector;
pub mod error;
pub mod extract;
pub mod traits;

pub use connector::{BinanceClient, BinanceConfig};
pub use error::*;
pub use extract::{extract, ExtractRequest, AGG_TRADES_PAGE_LIMIT};
pub use traits::*;
