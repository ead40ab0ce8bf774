//! 에러 타입 정의.

use etl_core::{ConfigError, LoggingError};
use etl_data::DataError;
use etl_exchange::ExchangeError;
use thiserror::Error;

/// Collector 에러 타입.
///
/// 모든 변형은 해당 실행에 치명적이며, 부분 성공 상태는 없습니다.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러
    #[error("Configuration error")]
    Config(#[from] ConfigError),

    /// 로깅 초기화 에러
    #[error("Logging setup error")]
    Logging(#[from] LoggingError),

    /// 추출 단계 에러 (HTTP, API, 파싱)
    #[error("Extraction failed")]
    Exchange(#[from] ExchangeError),

    /// 저장소 에러
    #[error("Storage error")]
    Data(#[from] DataError),
}

impl CollectorError {
    /// 원인 체인을 포함한 한 줄 메시지.
    pub fn chain(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
