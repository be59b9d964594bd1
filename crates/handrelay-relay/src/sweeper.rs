//! 유휴 세션 정리 태스크.
//!
//! `session_idle_timeout_secs > 0`일 때만 실행된다.

use chrono::Utc;
use handrelay_core::ports::session_store::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// 주기적으로 `max_idle` 이상 갱신되지 않은 세션을 삭제
pub async fn run_idle_sweeper(
    store: Arc<dyn SessionStore>,
    max_idle: Duration,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let Ok(max_idle_delta) = chrono::Duration::from_std(max_idle) else {
        warn!("유휴 만료 시간이 너무 큼 ({max_idle:?}), 정리 태스크 비활성화");
        return;
    };

    info!("유휴 세션 정리 시작: 만료 {max_idle:?}, 주기 {interval:?}");
    let mut ticker = tokio::time::interval(interval);
    // 첫 tick은 즉시 완료됨
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(cutoff) = Utc::now().checked_sub_signed(max_idle_delta) else {
                    continue;
                };
                let removed = store.expire_idle(cutoff);
                debug!("유휴 세션 정리: {removed}개 삭제, 남은 세션 {}개", store.session_count());
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
    info!("유휴 세션 정리 종료");
}
