//! aggTrade ETL CLI.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use etl_collector::{run_daemon, run_once};
use etl_core::{etl_span, init_logging, EtlConfig, LogConfig};
use etl_data::{CandleInterval, Database, PgTradeStore, TradeStore};
use etl_exchange::{BinanceClient, BinanceConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Instrument;

#[derive(Parser)]
#[command(name = "etl-collector")]
#[command(about = "Binance aggTrade ETL", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// 설정 파일 경로
    #[arg(long, default_value = "config/default.toml")]
    config: PathBuf,

    /// 로그 레벨 (trace, debug, info, warn, error). 설정 파일 값을 덮어씀
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// ETL 1회 실행 (기본값)
    Run,

    /// 데몬 모드: 주기적으로 ETL 실행
    Daemon,

    /// 마이그레이션 적용 (`trades` 테이블 생성)
    Migrate,

    /// 저장된 최대 trade_id 출력
    Latest,

    /// 최근 체결을 JSON 줄 단위로 출력 (trade_id 내림차순)
    Recent {
        /// 출력할 최대 행 수
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// 구간 캔들을 JSON 줄 단위로 출력
    Candles {
        /// 시작 시각 (RFC 3339, 예: 2024-01-01T00:00:00Z)
        #[arg(long)]
        start: DateTime<Utc>,

        /// 종료 시각 (RFC 3339, 포함)
        #[arg(long)]
        end: DateTime<Utc>,

        /// 캔들 단위 (second, minute, hour, day)
        #[arg(long, default_value = "day")]
        interval: CandleInterval,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> anyhow::Result<()> {
    // .env는 없어도 됨
    dotenvy::dotenv().ok();

    // 설정은 I/O 전에 한 번만 로드
    let config = EtlConfig::load(&cli.config)
        .with_context(|| format!("설정 로드 실패: {}", cli.config.display()))?;

    let mut log_config = LogConfig::from_settings(&config.logging);
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    let _log_guard = init_logging(log_config)?;

    tracing::info!(symbol = %config.symbol, "aggTrade ETL 시작");

    let db = Database::connect(&config.database).await?;
    tracing::info!("데이터베이스 연결 성공");

    let result = dispatch(cli.command.unwrap_or(Commands::Run), &config, &db).await;

    db.close().await;
    tracing::info!("aggTrade ETL 종료");

    result
}

async fn dispatch(command: Commands, config: &EtlConfig, db: &Database) -> anyhow::Result<()> {
    let store = PgTradeStore::new(db.clone());

    match command {
        Commands::Run => {
            let client = BinanceClient::new(BinanceConfig::from_http(&config.http))?;
            run_once(&client, &store, config)
                .instrument(etl_span!("etl_run", config.symbol))
                .await?;
        }
        Commands::Daemon => {
            let client = BinanceClient::new(BinanceConfig::from_http(&config.http))?;
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "종료 신호 대기 실패");
                }
            };
            let runs = run_daemon(&client, &store, config, shutdown)
                .instrument(etl_span!("etl_daemon", config.symbol))
                .await;
            tracing::info!(runs = runs, "데몬 종료");
        }
        Commands::Migrate => {
            db.migrate().await?;
        }
        Commands::Latest => match store.latest_trade_id().await? {
            Some(id) => println!("{}", id),
            None => println!("none"),
        },
        Commands::Recent { limit } => {
            for trade in store.recent(limit).await? {
                println!("{}", serde_json::to_string(&trade)?);
            }
        }
        Commands::Candles {
            start,
            end,
            interval,
        } => {
            anyhow::ensure!(start <= end, "--start는 --end보다 늦을 수 없습니다");

            let candles = store.candles(start, end, interval).await?;
            tracing::info!(count = candles.len(), %interval, "캔들 조회 완료");

            for candle in &candles {
                println!("{}", serde_json::to_string(candle)?);
            }
        }
    }

    Ok(())
}
