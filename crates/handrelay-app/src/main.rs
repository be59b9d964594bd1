//! # handrelay
//!
//! 손 랜드마크 릴레이 바이너리 진입점.
//! `serve`: 릴레이 서버, `capture`: 캡처 어댑터, `observe`: 관찰 클라이언트.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use handrelay_app::capture::{run_capture, StopReason, SyntheticHandSource};
use handrelay_app::lifecycle::LifecycleManager;
use handrelay_app::observer::run_observer;
use handrelay_core::config::AppConfig;
use handrelay_core::ports::session_store::SessionStore;
use handrelay_relay::RelayServer;
use handrelay_storage::MemorySessionStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 손 랜드마크 릴레이
#[derive(Parser, Debug)]
#[command(name = "handrelay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    /// 설정 파일 경로 (TOML/YAML/JSON)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 릴레이 서버 실행
    Serve {
        /// 바인드 주소 (기본: 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// 포트 (기본: 5000)
        #[arg(long, short = 'p')]
        port: Option<u16>,

        /// 세션당 보관 프레임 수 (기본: 100)
        #[arg(long)]
        history_capacity: Option<usize>,

        /// 유휴 세션 만료 시간 (초, 0이면 만료 없음)
        #[arg(long)]
        idle_timeout: Option<u64>,
    },
    /// 랜드마크 캡처 후 릴레이로 스트리밍
    Capture {
        /// 릴레이 WebSocket URL (기본: ws://localhost:5000/ws)
        #[arg(long, short = 's')]
        server: Option<String>,

        /// 카메라 장치 인덱스
        #[arg(long)]
        camera: Option<u32>,

        /// 처리할 최대 프레임 수
        #[arg(long)]
        max_frames: Option<u64>,

        /// 프레임 간격 (밀리초)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// 브로드캐스트 관찰 및 이력 주기 조회
    Observe {
        /// 릴레이 WebSocket URL
        #[arg(long, short = 's')]
        server: Option<String>,

        /// 이력 조회 주기 (밀리초)
        #[arg(long)]
        poll: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "handrelay={},handrelay_app={},handrelay_core={},handrelay_storage={},handrelay_network={},handrelay_relay={},tower_http={}",
        args.log_level,
        args.log_level,
        args.log_level,
        args.log_level,
        args.log_level,
        args.log_level,
        args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let mut config = AppConfig::load(args.config.as_deref()).context("설정 로드 실패")?;

    let lifecycle = Arc::new(LifecycleManager::new());
    let signal_lifecycle = lifecycle.clone();
    tokio::spawn(async move {
        signal_lifecycle.wait_for_signal().await;
    });

    match args.command {
        Command::Serve {
            host,
            port,
            history_capacity,
            idle_timeout,
        } => {
            // CLI 인자로 설정 오버라이드
            if let Some(host) = host {
                config.relay.host = host;
            }
            if let Some(port) = port {
                config.relay.port = port;
            }
            if let Some(capacity) = history_capacity {
                config.relay.history_capacity = capacity;
            }
            if let Some(secs) = idle_timeout {
                config.relay.session_idle_timeout_secs = secs;
            }
            config.validate().context("설정 검증 실패")?;
            serve(config, &lifecycle).await
        }
        Command::Capture {
            server,
            camera,
            max_frames,
            interval,
        } => {
            if let Some(server) = server {
                config.capture.server_url = server;
            }
            if let Some(camera) = camera {
                config.capture.camera_index = camera;
            }
            if max_frames.is_some() {
                config.capture.max_frames = max_frames;
            }
            if let Some(interval) = interval {
                config.capture.frame_interval_ms = interval;
            }

            let mut source = SyntheticHandSource::new(config.capture.camera_index);
            let report = run_capture(&mut source, &config.capture, lifecycle.subscribe()).await;
            if let StopReason::SourceFailed(reason) = report.stop_reason {
                bail!("랜드마크 소스 실패: {reason}");
            }
            Ok(())
        }
        Command::Observe { server, poll } => {
            if let Some(server) = server {
                config.observer.server_url = server;
            }
            if let Some(poll) = poll {
                config.observer.poll_interval_ms = poll;
            }
            run_observer(&config.observer, lifecycle.subscribe()).await;
            Ok(())
        }
    }
}

/// 릴레이 서버 실행 (종료 신호까지)
async fn serve(config: AppConfig, lifecycle: &LifecycleManager) -> Result<()> {
    let store: Arc<dyn SessionStore> =
        Arc::new(MemorySessionStore::new(config.relay.history_capacity));
    let server = RelayServer::new(store, config.relay.clone());
    info!("handrelay 릴레이: {}", server.url());

    server
        .run(lifecycle.subscribe())
        .await
        .context("릴레이 서버 실행 실패")?;
    Ok(())
}
