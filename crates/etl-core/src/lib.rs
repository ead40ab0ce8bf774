//! # ETL Core
//!
//! aggTrade ETL 파이프라인의 핵심 타입을 제공합니다:
//! - 원본/정규화 체결 모델 (`AggTrade`, `TradeRecord`)
//! - 순수 변환 함수 (`transform`)
//! - 설정 관리 (`EtlConfig`)
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod transform;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use transform::{normalize, transform};
