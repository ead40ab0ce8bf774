//! 체결 데이터 도메인 모델.

mod trade;

pub use trade::*;
