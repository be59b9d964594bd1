//! 라이프사이클 관리.
//!
//! 종료 신호 채널과 OS 시그널 대기.

use tokio::sync::watch;
use tracing::{info, warn};

/// 종료 신호 소유자
///
/// 릴레이 서버, 유휴 세션 정리, 캡처/관찰 루프가 같은 수신기를 구독한다.
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { shutdown_tx }
    }

    /// 종료 수신기 생성
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// 종료 신호 발송
    pub fn shutdown(&self) {
        info!("종료 신호 발송");
        self.shutdown_tx.send_replace(true);
    }

    /// OS 시그널(SIGINT, SIGTERM) 대기 후 종료 신호 발송
    pub async fn wait_for_signal(&self) {
        wait_os_signal().await;
        self.shutdown();
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn wait_os_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigint, mut sigterm) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
        (Err(e), _) | (_, Err(e)) => {
            warn!("시그널 핸들러 등록 실패, Ctrl+C만 대기: {e}");
            wait_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigint.recv() => info!("SIGINT 수신"),
        _ = sigterm.recv() => info!("SIGTERM 수신"),
    }
}

#[cfg(not(unix))]
async fn wait_os_signal() {
    wait_ctrl_c().await;
}

async fn wait_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C 수신"),
        Err(e) => {
            // 시그널을 받을 수 없으면 외부 종료만 가능
            warn!("Ctrl+C 핸들러 등록 실패: {e}");
            std::future::pending::<()>().await;
        }
    }
}
