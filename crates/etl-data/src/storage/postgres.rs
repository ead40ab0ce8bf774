//! PostgreSQL 스토리지 구현.

use super::TradeStore;
use crate::analytics::CandleInterval;
use crate::error::{DataError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use etl_core::{Candle, DatabaseConfig, OrderType, TradeRecord};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// 한 번의 INSERT에 담는 최대 행 수.
const INSERT_CHUNK_SIZE: usize = 500;

/// 데이터베이스 연결 풀 래퍼.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 새로운 데이터베이스 연결 풀을 생성합니다.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// 내부 연결 풀을 반환합니다.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 데이터베이스 마이그레이션을 실행합니다.
    ///
    /// `trades` 테이블은 여기서만 생성되며 적재 단계는 테이블을 만들지 않습니다.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");

        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DataError::MigrationError(e.to_string()))?;

        info!("Migrations completed successfully");
        Ok(())
    }

    /// 연결 풀을 닫습니다.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// `trades` 테이블 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct TradeRow {
    pub trade_id: i64,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub quote_qty: Option<f64>,
    pub time: Option<DateTime<Utc>>,
    pub order_type: String,
}

impl TradeRow {
    /// 도메인 레코드로 변환.
    pub fn into_record(self) -> Result<TradeRecord> {
        let order_type: OrderType = self.order_type.parse().map_err(DataError::InvalidData)?;

        Ok(TradeRecord {
            trade_id: self.trade_id,
            price: self.price,
            quantity: self.quantity,
            quote_qty: self.quote_qty,
            time: self.time,
            order_type,
        })
    }
}

#[derive(Debug, FromRow)]
struct CandleRow {
    bucket: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

/// `trades` 테이블 repository.
#[derive(Clone)]
pub struct PgTradeStore {
    db: Database,
}

impl PgTradeStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TradeStore for PgTradeStore {
    async fn latest_trade_id(&self) -> Result<Option<i64>> {
        let (max,): (Option<i64>,) = sqlx::query_as("SELECT MAX(trade_id) FROM trades")
            .fetch_one(self.db.pool())
            .await?;

        debug!(latest_trade_id = ?max, "저장된 최대 trade_id 조회");
        Ok(max)
    }

    /// UNNEST 패턴으로 일괄 삽입합니다. 모든 청크는 하나의 트랜잭션 안에서 실행됩니다.
    #[instrument(skip(self, trades), fields(count = trades.len()))]
    async fn append(&self, trades: &[TradeRecord]) -> Result<usize> {
        if trades.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;
        let mut inserted = 0;

        for chunk in trades.chunks(INSERT_CHUNK_SIZE) {
            let ids: Vec<i64> = chunk.iter().map(|t| t.trade_id).collect();
            let prices: Vec<Option<f64>> = chunk.iter().map(|t| t.price).collect();
            let quantities: Vec<Option<f64>> = chunk.iter().map(|t| t.quantity).collect();
            let quote_qtys: Vec<Option<f64>> = chunk.iter().map(|t| t.quote_qty).collect();
            let times: Vec<Option<DateTime<Utc>>> = chunk.iter().map(|t| t.time).collect();
            let order_types: Vec<&str> = chunk.iter().map(|t| t.order_type.as_str()).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO trades (trade_id, price, quantity, quote_qty, time, order_type)
                SELECT * FROM UNNEST(
                    $1::bigint[], $2::float8[], $3::float8[], $4::float8[],
                    $5::timestamptz[], $6::text[]
                )
                "#,
            )
            .bind(&ids)
            .bind(&prices)
            .bind(&quantities)
            .bind(&quote_qtys)
            .bind(&times)
            .bind(&order_types)
            .execute(&mut *tx)
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;

            inserted += result.rows_affected() as usize;
        }

        tx.commit()
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;

        info!(inserted = inserted, "체결 데이터 저장");

        Ok(inserted)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<TradeRecord>> {
        let rows: Vec<TradeRow> = sqlx::query_as(
            r#"
            SELECT trade_id, price, quantity, quote_qty, time, order_type
            FROM trades
            ORDER BY trade_id DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(TradeRow::into_record).collect()
    }

    #[instrument(skip(self))]
    async fn candles(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>> {
        let rows: Vec<CandleRow> = sqlx::query_as(
            r#"
            SELECT
                date_trunc($1, time) AS bucket,
                (array_agg(price ORDER BY time ASC, trade_id ASC))[1] AS open,
                MAX(price) AS high,
                MIN(price) AS low,
                (array_agg(price ORDER BY time DESC, trade_id DESC))[1] AS close
            FROM trades
            WHERE time BETWEEN $2 AND $3
              AND price IS NOT NULL
            GROUP BY bucket
            ORDER BY bucket ASC
            "#,
        )
        .bind(interval.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Candle {
                bucket: r.bucket,
                open: r.open,
                high: r.high,
                low: r.low,
                close: r.close,
            })
            .collect())
    }
}
