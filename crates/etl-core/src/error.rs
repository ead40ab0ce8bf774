//! 공통 에러 타입.
//!
//! 설정 로드와 로깅 초기화 단계의 에러를 정의합니다. 두 에러 모두 어떤
//! I/O도 시작하기 전에 발생하며 실행을 즉시 중단시킵니다.

use thiserror::Error;

/// 설정 에러.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 설정 소스(파일, 환경 변수)를 읽거나 역직렬화하지 못함
    #[error("설정 로드 실패: {0}")]
    Load(#[from] config::ConfigError),

    /// 필수 키 누락
    #[error("필수 설정 누락: {0}")]
    Missing(String),

    /// 잘못된 값
    #[error("잘못된 설정 값 '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// 로깅 초기화 에러.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// 로그 필터 식 파싱 실패
    #[error("잘못된 로그 필터: {0}")]
    Filter(String),

    /// 로그 파일 싱크 생성 실패
    #[error("로그 파일 생성 실패: {0}")]
    FileSink(String),

    /// 전역 subscriber 설치 실패
    #[error("subscriber 설치 실패: {0}")]
    Install(String),
}
