//! 데몬 모드: 주기적으로 ETL 실행.

use super::etl_run::run_once;
use etl_core::EtlConfig;
use etl_data::TradeStore;
use etl_exchange::AggTradeSource;
use std::future::Future;
use tokio::time::MissedTickBehavior;

/// `shutdown`이 완료될 때까지 `daemon.interval_minutes`마다 한 번씩 실행합니다.
///
/// 실행은 겹치지 않으며, 실행이 주기보다 길어지면 놓친 tick은 건너뜁니다.
/// 실패한 실행은 로그만 남기고 다음 tick에서 다시 시도합니다. 반환값은 완료된
/// 실행 횟수(성공 + 실패)입니다.
pub async fn run_daemon<S, T, F>(source: &S, store: &T, config: &EtlConfig, shutdown: F) -> usize
where
    S: AggTradeSource + ?Sized,
    T: TradeStore + ?Sized,
    F: Future<Output = ()>,
{
    tracing::info!(
        "=== 데몬 모드 시작 (주기: {}분) ===",
        config.daemon.interval_minutes
    );

    let mut interval = tokio::time::interval(config.daemon.interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut runs = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("종료 신호 수신, 데몬 종료 중...");
                break;
            }
            _ = interval.tick() => {
                // 실패는 run_once 안에서 이미 기록됨
                let _ = run_once(source, store, config).await;
                runs += 1;

                tracing::info!(
                    "=== 실행 완료, 다음 실행: {}분 후 ===",
                    config.daemon.interval_minutes
                );
            }
        }
    }

    runs
}
