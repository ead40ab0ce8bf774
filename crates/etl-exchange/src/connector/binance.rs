//! Binance 거래소 커넥터.
//!
//! Binance Spot 공개 REST API 중 집계 체결(`/api/v3/aggTrades`) 조회 구현.
//! 인증이 필요 없는 엔드포인트만 사용합니다.

use crate::traits::{AggTradeSource, ExchangeResult, PageCursor};
use crate::ExchangeError;
use async_trait::async_trait;
use etl_core::{AggTrade, HttpConfig, DEFAULT_BASE_URL};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

const AGG_TRADES_ENDPOINT: &str = "/api/v3/aggTrades";

// ============================================================================
// 설정
// ============================================================================

/// Binance 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// REST API 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초, 0이면 타임아웃 없음)
    pub timeout_secs: u64,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl BinanceConfig {
    /// 새 설정 생성.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// 요청 타임아웃 설정.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// 애플리케이션 HTTP 설정에서 생성.
    pub fn from_http(http: &HttpConfig) -> Self {
        Self {
            base_url: http.base_url.clone(),
            timeout_secs: http.timeout_secs,
        }
    }

    /// REST API 기본 URL 반환 (끝의 `/` 제거).
    pub fn rest_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

// ============================================================================
// API 응답 타입
// ============================================================================

#[derive(Debug, Deserialize)]
struct BinanceError {
    code: i32,
    msg: String,
}

// ============================================================================
// Binance 클라이언트
// ============================================================================

/// Binance 공개 REST 클라이언트.
pub struct BinanceClient {
    config: BinanceConfig,
    client: Client,
}

impl BinanceClient {
    /// 새 Binance 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::NetworkError`를 반환합니다.
    pub fn new(config: BinanceConfig) -> Result<Self, ExchangeError> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }

        let client = builder.build().map_err(|e| {
            ExchangeError::NetworkError(format!("HTTP 클라이언트 생성 실패: {}", e))
        })?;

        Ok(Self { config, client })
    }

    /// 집계 체결 요청 파라미터.
    ///
    /// `startTime`과 `fromId`는 동시에 보내지 않습니다.
    fn agg_trade_params(symbol: &str, cursor: PageCursor, limit: u32) -> Vec<(&'static str, String)> {
        let position = match cursor {
            PageCursor::StartTime(ms) => ("startTime", ms.to_string()),
            PageCursor::FromId(id) => ("fromId", id.to_string()),
        };

        vec![
            ("symbol", symbol.to_string()),
            position,
            ("limit", limit.to_string()),
        ]
    }

    /// 공개 API 요청 (인증 불필요).
    async fn public_get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<T> {
        let url = format!("{}{}", self.config.rest_base_url(), endpoint);

        debug!(url = %url, params = ?params, "GET");

        // 값은 reqwest가 퍼센트 인코딩
        let response = self.client.get(&url).query(params).send().await?;

        self.handle_response(response).await
    }

    /// API 응답 처리.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> ExchangeResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse response: {} - Body: {}", e, body);
                ExchangeError::ParseError(e.to_string())
            })
        } else if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
            Err(ExchangeError::RateLimited(format!("HTTP {}: {}", status, body)))
        } else if let Ok(error) = serde_json::from_str::<BinanceError>(&body) {
            Err(Self::map_error_code(error.code, &error.msg))
        } else {
            Err(ExchangeError::ApiError {
                code: status.as_u16() as i32,
                message: body,
            })
        }
    }

    /// Binance 에러 코드를 ExchangeError로 매핑.
    fn map_error_code(code: i32, msg: &str) -> ExchangeError {
        match code {
            -1003 => ExchangeError::RateLimited(msg.to_string()),
            -1001 => ExchangeError::NetworkError(msg.to_string()),
            _ => ExchangeError::ApiError {
                code,
                message: msg.to_string(),
            },
        }
    }

    /// 집계 체결 한 페이지 조회.
    pub async fn get_agg_trades(
        &self,
        symbol: &str,
        cursor: PageCursor,
        limit: u32,
    ) -> ExchangeResult<Vec<AggTrade>> {
        let params = Self::agg_trade_params(symbol, cursor, limit);
        self.public_get(AGG_TRADES_ENDPOINT, &params).await
    }
}

#[async_trait]
impl AggTradeSource for BinanceClient {
    async fn fetch_page(
        &self,
        symbol: &str,
        cursor: PageCursor,
        limit: u32,
    ) -> ExchangeResult<Vec<AggTrade>> {
        self.get_agg_trades(symbol, cursor, limit).await
    }
}
