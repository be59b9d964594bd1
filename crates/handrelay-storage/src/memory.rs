//! 인메모리 세션 저장소.
//!
//! 세션 ID → 고정 용량 프레임 링 버퍼. 세션은 첫 프레임 수신 시 생성된다.

use chrono::{DateTime, Utc};
use handrelay_core::error::CoreError;
use handrelay_core::models::landmark::Frame;
use handrelay_core::ports::session_store::SessionStore;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

/// 한 세션의 프레임 이력 (FIFO, 최대 크기 제한)
#[derive(Debug, Clone)]
pub struct SessionHistory {
    frames: VecDeque<Frame>,
    capacity: usize,
    last_updated: DateTime<Utc>,
}

impl SessionHistory {
    /// 새 이력 버퍼 생성
    pub fn new(capacity: usize, now: DateTime<Utc>) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            last_updated: now,
        }
    }

    /// 프레임 추가. 가득 차 있으면 가장 오래된 프레임을 버린다.
    pub fn push(&mut self, frame: Frame, now: DateTime<Utc>) -> usize {
        if self.frames.len() >= self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
        self.last_updated = now;
        self.frames.len()
    }

    /// 오래된 것 → 최신 순 복제본
    pub fn snapshot(&self) -> Vec<Frame> {
        self.frames.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 마지막 프레임 추가 시각
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

/// 인메모리 세션 저장소
///
/// 뮤텍스는 await 지점을 넘어 보유되지 않으므로
/// 같은 세션에 대한 `append` 두 개가 섞이지 않는다.
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, SessionHistory>>,
    capacity: usize,
}

impl MemorySessionStore {
    /// 세션당 `capacity` 프레임을 보관하는 저장소 생성
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn append_at(
        &self,
        session_id: &str,
        frame: Frame,
        now: DateTime<Utc>,
    ) -> Result<usize, CoreError> {
        if session_id.is_empty() {
            return Err(CoreError::validation("session_id", "비어 있음"));
        }
        if frame.is_empty() {
            return Err(CoreError::validation("frame", "랜드마크 없음"));
        }

        let mut sessions = self.sessions.lock();
        let history = sessions.entry(session_id.to_string()).or_insert_with(|| {
            info!("새 세션 생성: {session_id}");
            SessionHistory::new(self.capacity, now)
        });
        let count = history.push(frame, now);
        debug!("세션 {session_id}: 프레임 {count}개 보관");
        Ok(count)
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(100)
    }
}

impl SessionStore for MemorySessionStore {
    fn append(&self, session_id: &str, frame: Frame) -> Result<usize, CoreError> {
        self.append_at(session_id, frame, Utc::now())
    }

    fn get(&self, session_id: &str) -> Vec<Frame> {
        self.sessions
            .lock()
            .get(session_id)
            .map(SessionHistory::snapshot)
            .unwrap_or_default()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    fn expire_idle(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, history| history.last_updated() >= cutoff);
        let removed = before - sessions.len();
        if removed > 0 {
            info!("유휴 세션 {removed}개 만료 (남은 세션 {}개)", sessions.len());
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use handrelay_core::models::landmark::{Landmark, LANDMARKS_PER_FRAME};
    use std::sync::Arc;

    /// 시퀀스 번호를 x 좌표에 담은 21점 프레임
    fn numbered_frame(n: usize) -> Frame {
        (0..LANDMARKS_PER_FRAME)
            .map(|j| Landmark::new(n as f64, j as f64 / 20.0, 0.0))
            .collect::<Vec<_>>()
            .into()
    }

    fn sequence_of(frames: &[Frame]) -> Vec<usize> {
        frames
            .iter()
            .map(|f| f.landmarks()[0].x as usize)
            .collect()
    }

    #[test]
    fn append_below_capacity_keeps_insertion_order() {
        let store = MemorySessionStore::new(100);
        for n in 1..=42 {
            assert_eq!(store.append("s", numbered_frame(n)).unwrap(), n);
        }

        let frames = store.get("s");
        assert_eq!(frames.len(), 42);
        assert_eq!(sequence_of(&frames), (1..=42).collect::<Vec<_>>());
    }

    #[test]
    fn append_past_capacity_evicts_oldest() {
        let store = MemorySessionStore::new(100);
        for n in 1..=150 {
            let count = store.append("s", numbered_frame(n)).unwrap();
            assert_eq!(count, n.min(100));
        }

        let frames = store.get("s");
        assert_eq!(frames.len(), 100);
        assert_eq!(sequence_of(&frames), (51..=150).collect::<Vec<_>>());
    }

    #[test]
    fn unknown_session_returns_empty() {
        let store = MemorySessionStore::default();
        assert!(store.get("unknown-id").is_empty());
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn sessions_are_isolated() {
        let store = MemorySessionStore::new(3);
        store.append("a", numbered_frame(1)).unwrap();
        store.append("b", numbered_frame(2)).unwrap();
        store.append("a", numbered_frame(3)).unwrap();

        assert_eq!(sequence_of(&store.get("a")), vec![1, 3]);
        assert_eq!(sequence_of(&store.get("b")), vec![2]);
        assert_eq!(store.session_count(), 2);
    }

    #[test]
    fn malformed_input_does_not_mutate() {
        let store = MemorySessionStore::new(10);

        assert!(matches!(
            store.append("", numbered_frame(1)),
            Err(CoreError::Validation { .. })
        ));
        assert!(matches!(
            store.append("s", Frame::default()),
            Err(CoreError::Validation { .. })
        ));

        assert_eq!(store.session_count(), 0);
        assert!(store.get("s").is_empty());
    }

    #[test]
    fn frame_shape_is_not_validated() {
        let store = MemorySessionStore::new(10);
        let short = Frame::new(vec![Landmark::new(0.5, 0.5, 0.0)]);
        assert_eq!(store.append("s", short.clone()).unwrap(), 1);
        assert_eq!(store.get("s"), vec![short]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let store = MemorySessionStore::new(0);
        assert_eq!(store.capacity(), 1);
        store.append("s", numbered_frame(1)).unwrap();
        store.append("s", numbered_frame(2)).unwrap();
        assert_eq!(sequence_of(&store.get("s")), vec![2]);
    }

    #[test]
    fn expire_idle_removes_stale_sessions() {
        let store = MemorySessionStore::new(10);
        let now = Utc::now();
        store
            .append_at("old", numbered_frame(1), now - Duration::minutes(30))
            .unwrap();
        store.append_at("fresh", numbered_frame(2), now).unwrap();

        let removed = store.expire_idle(now - Duration::minutes(10));
        assert_eq!(removed, 1);
        assert!(store.get("old").is_empty());
        assert_eq!(store.get("fresh").len(), 1);
    }

    #[test]
    fn expire_idle_on_empty_store() {
        let store = MemorySessionStore::default();
        assert_eq!(store.expire_idle(Utc::now()), 0);
    }

    #[test]
    fn append_refreshes_last_updated() {
        let mut history = SessionHistory::new(2, Utc::now() - Duration::hours(1));
        let now = Utc::now();
        history.push(numbered_frame(1), now);
        assert_eq!(history.last_updated(), now);
        assert_eq!(history.len(), 1);
        assert!(!history.is_empty());
    }

    #[test]
    fn concurrent_appends_stay_bounded() {
        let store = Arc::new(MemorySessionStore::new(100));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for n in 0..50 {
                        store.append("shared", numbered_frame(t * 1000 + n)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let frames = store.get("shared");
        assert_eq!(frames.len(), 100);

        // 스레드별 순서는 유지되어야 함
        let seq = sequence_of(&frames);
        for t in 0..8 {
            let per_thread: Vec<_> = seq.iter().filter(|n| **n / 1000 == t).collect();
            assert!(per_thread.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[tokio::test]
    async fn shared_store_through_trait_object() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(5));
        let writer = store.clone();
        tokio::spawn(async move {
            for n in 1..=7 {
                writer.append("t", numbered_frame(n)).unwrap();
            }
        })
        .await
        .unwrap();

        assert_eq!(sequence_of(&store.get("t")), vec![3, 4, 5, 6, 7]);
        assert_eq!(store.capacity(), 5);
    }
}
