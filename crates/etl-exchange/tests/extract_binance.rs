//! 모의 Binance REST API를 상대로 한 페이지네이션 추출 통합 테스트.

use etl_exchange::{extract, BinanceClient, BinanceConfig, ExchangeError, ExtractRequest};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

fn agg_trade(trade_id: i64, time: i64) -> serde_json::Value {
    json!({
        "a": trade_id,
        "p": "0.01633102",
        "q": "4.70443515",
        "f": 27781,
        "l": 27781,
        "T": time,
        "m": true,
        "M": true
    })
}

fn client(server: &ServerGuard) -> BinanceClient {
    BinanceClient::new(BinanceConfig::new(server.url())).expect("클라이언트 생성 실패")
}

fn query(pairs: &[(&str, &str)]) -> Matcher {
    Matcher::AllOf(
        pairs
            .iter()
            .map(|(k, v)| Matcher::UrlEncoded(k.to_string(), v.to_string()))
            .collect(),
    )
}

/// 시각 기준으로 시작한 뒤 종료 시각까지 `fromId` 커서를 따라간다.
#[tokio::test]
async fn test_extract_paginates_until_end_time() {
    let mut server = Server::new_async().await;

    let first = server
        .mock("GET", "/api/v3/aggTrades")
        .match_query(query(&[
            ("symbol", "BTCUSDT"),
            ("startTime", "1000"),
            ("limit", "1000"),
        ]))
        .with_status(200)
        .with_body(json!([agg_trade(1, 1000), agg_trade(2, 2000)]).to_string())
        .expect(1)
        .create_async()
        .await;

    let second = server
        .mock("GET", "/api/v3/aggTrades")
        .match_query(query(&[
            ("symbol", "BTCUSDT"),
            ("fromId", "3"),
            ("limit", "1000"),
        ]))
        .with_status(200)
        .with_body(json!([agg_trade(3, 2500), agg_trade(4, 3000)]).to_string())
        .expect(1)
        .create_async()
        .await;

    let third = server
        .mock("GET", "/api/v3/aggTrades")
        .match_query(query(&[
            ("symbol", "BTCUSDT"),
            ("fromId", "5"),
            ("limit", "1000"),
        ]))
        .with_status(200)
        .with_body(json!([agg_trade(5, 5000)]).to_string())
        .expect(1)
        .create_async()
        .await;

    let request = ExtractRequest::new("BTCUSDT", 1000).with_end_time(4000);
    let trades = extract(&client(&server), &request).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    third.assert_async().await;

    assert_eq!(trades.len(), 5);
    let ids: Vec<i64> = trades.iter().map(|t| t.agg_trade_id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

/// 저장된 커서가 있으면 첫 요청부터 `fromId`를 쓰고 `startTime`은 보내지 않는다.
#[tokio::test]
async fn test_extract_uses_trade_id_if_provided() {
    let mut server = Server::new_async().await;

    let by_time = server
        .mock("GET", "/api/v3/aggTrades")
        .match_query(Matcher::Regex("startTime=".to_string()))
        .with_status(200)
        .with_body("[]")
        .expect(0)
        .create_async()
        .await;

    let by_id = server
        .mock("GET", "/api/v3/aggTrades")
        .match_query(query(&[
            ("symbol", "BTCUSDT"),
            ("fromId", "100"),
            ("limit", "1000"),
        ]))
        .with_status(200)
        .with_body(json!([agg_trade(100, 1234)]).to_string())
        .expect(1)
        .create_async()
        .await;

    let request = ExtractRequest::new("BTCUSDT", 0)
        .with_trade_id(Some(100))
        .with_end_time(1000);
    let trades = extract(&client(&server), &request).await.unwrap();

    by_time.assert_async().await;
    by_id.assert_async().await;

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].agg_trade_id, 100);
}

/// 한 페이지라도 실패하면 추출 전체가 중단된다.
#[tokio::test]
async fn test_extract_fails_on_non_success_status() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/api/v3/aggTrades")
        .match_query(query(&[("startTime", "1000")]))
        .with_status(200)
        .with_body(json!([agg_trade(1, 1000)]).to_string())
        .create_async()
        .await;

    server
        .mock("GET", "/api/v3/aggTrades")
        .match_query(query(&[("fromId", "2")]))
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let request = ExtractRequest::new("BTCUSDT", 1000).with_end_time(4000);
    let err = extract(&client(&server), &request).await.unwrap_err();

    assert!(matches!(err, ExchangeError::ApiError { code: 500, .. }));
}
