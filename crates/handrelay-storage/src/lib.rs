//! # handrelay-storage
//!
//! 세션 저장소 어댑터.
//! 세션 ID별로 최근 프레임을 고정 용량 FIFO로 보관한다.
//! 프로세스 메모리 외 영속화는 없다.
//!
//! ## 모듈
//! - `memory`: 인메모리 세션 저장소 (SessionStore 구현)

pub mod memory;

pub use memory::{MemorySessionStore, SessionHistory};
