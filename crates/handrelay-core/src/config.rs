//! 애플리케이션 설정 구조체.
//!
//! 릴레이 서버 주소, 이력 용량, 비밀 키, 캡처/관찰 클라이언트 주기 등
//! 런타임 설정을 정의한다. `config` crate를 통해 파일/환경변수에서 로드.
//!
//! 우선순위: 기본값 → 설정 파일 → `HANDRELAY__섹션__키` 환경변수
//! → `HANDRELAY_SECRET_KEY` → CLI 인자 (바이너리에서 적용)

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::CoreError;

/// 비밀 키 환경변수 이름
pub const SECRET_KEY_ENV: &str = "HANDRELAY_SECRET_KEY";

/// 비밀 키 미설정 시 사용되는 개발용 기본값
pub const FALLBACK_SECRET_KEY: &str = "fallback_dev_key";

/// 환경변수 접두어 (`HANDRELAY__RELAY__PORT=6000`)
const ENV_PREFIX: &str = "HANDRELAY";

/// 환경변수 섹션 구분자
const ENV_SEPARATOR: &str = "__";

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 릴레이 서버 설정
    #[serde(default)]
    pub relay: RelayConfig,
    /// 캡처 어댑터 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 관찰 클라이언트 설정
    #[serde(default)]
    pub observer: ObserverConfig,
}

// ============================================================
// 릴레이 서버 설정
// ============================================================

/// 릴레이 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// 바인드 주소 (기본: 모든 인터페이스)
    #[serde(default = "default_host")]
    pub host: String,
    /// 고정 포트 (기본: 5000)
    #[serde(default = "default_port")]
    pub port: u16,
    /// 세션당 보관 프레임 수 (기본: 100)
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// 브로드캐스트 채널 용량
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
    /// 서버 비밀 키
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
    /// 유휴 세션 만료 시간 (초, 0이면 만료 없음)
    #[serde(default)]
    pub session_idle_timeout_secs: u64,
    /// 유휴 세션 정리 주기 (초)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_history_capacity() -> usize {
    100
}
fn default_broadcast_capacity() -> usize {
    256
}
fn default_secret_key() -> String {
    FALLBACK_SECRET_KEY.to_string()
}
fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            history_capacity: default_history_capacity(),
            broadcast_capacity: default_broadcast_capacity(),
            secret_key: default_secret_key(),
            session_idle_timeout_secs: 0,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RelayConfig {
    /// 바인드 주소 문자열 (`host:port`)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 유휴 세션 만료 시간 (비활성화면 None)
    pub fn session_idle_timeout(&self) -> Option<Duration> {
        (self.session_idle_timeout_secs > 0)
            .then(|| Duration::from_secs(self.session_idle_timeout_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// 개발용 기본 비밀 키 사용 여부
    pub fn uses_fallback_secret(&self) -> bool {
        self.secret_key == FALLBACK_SECRET_KEY
    }
}

// ============================================================
// 캡처 어댑터 설정
// ============================================================

/// 캡처 어댑터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 릴레이 WebSocket URL
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// 카메라 장치 인덱스
    #[serde(default)]
    pub camera_index: u32,
    /// 프레임 간격 (밀리초, 기본: ~30fps)
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// 처리할 최대 영상 프레임 수 (None이면 무제한)
    #[serde(default)]
    pub max_frames: Option<u64>,
}

fn default_server_url() -> String {
    "ws://localhost:5000/ws".to_string()
}
fn default_frame_interval_ms() -> u64 {
    33
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            camera_index: 0,
            frame_interval_ms: default_frame_interval_ms(),
            max_frames: None,
        }
    }
}

impl CaptureConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

// ============================================================
// 관찰 클라이언트 설정
// ============================================================

/// 관찰 클라이언트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// 릴레이 WebSocket URL
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// 이력 조회 주기 (밀리초)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ObserverConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// ============================================================
// 로드 / 검증
// ============================================================

impl AppConfig {
    /// 설정 파일(선택)과 프로세스 환경변수에서 로드
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let env = config::Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true);
        let mut config = Self::load_from(path, env)?;
        config.relay.secret_key = resolve_secret_key(std::env::var(SECRET_KEY_ENV).ok())
            .unwrap_or(config.relay.secret_key);
        config.validate()?;
        Ok(config)
    }

    /// 지정된 환경변수 소스로 로드 (비밀 키 환경변수는 적용하지 않음)
    pub fn load_from(path: Option<&Path>, env: config::Environment) -> Result<Self, CoreError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!("설정 파일 로드: {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let loaded: AppConfig = builder.add_source(env).build()?.try_deserialize()?;
        Ok(loaded)
    }

    /// 값 범위 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.relay.history_capacity == 0 {
            return Err(CoreError::validation(
                "relay.history_capacity",
                "1 이상이어야 함",
            ));
        }
        if self.relay.broadcast_capacity == 0 {
            return Err(CoreError::validation(
                "relay.broadcast_capacity",
                "1 이상이어야 함",
            ));
        }
        if self.relay.host.trim().is_empty() {
            return Err(CoreError::validation("relay.host", "비어 있음"));
        }
        if self.relay.uses_fallback_secret() {
            warn!("{SECRET_KEY_ENV} 미설정, 개발용 기본 비밀 키 사용");
        }
        Ok(())
    }
}

/// 환경변수 값이 비어 있지 않으면 비밀 키로 사용
pub fn resolve_secret_key(env_value: Option<String>) -> Option<String> {
    env_value.filter(|v| !v.trim().is_empty())
}
