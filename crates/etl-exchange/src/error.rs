//! 거래소 에러 타입.

use thiserror::Error;

/// 거래소 관련 에러.
///
/// 추출 단계에서 발생하는 모든 에러는 해당 실행에 치명적이며,
/// 부분 결과 없이 호출자에게 전파됩니다.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 요청 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 요청 한도 초과
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// API 에러 코드 (Binance 에러 코드 또는 HTTP 상태)
    #[error("API error {code}: {message}")]
    ApiError { code: i32, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 잘못된 요청 (전송 전에 거부)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 응답 페이지가 커서를 전진시키지 못함
    #[error("Cursor stalled: requested fromId={from_id}, page ended at id={last_id}")]
    CursorStalled { from_id: i64, last_id: i64 },
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else if err.is_decode() {
            ExchangeError::ParseError(err.to_string())
        } else {
            ExchangeError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}
