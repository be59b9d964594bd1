//! HTTP / WebSocket 핸들러 모듈.

pub mod index;
pub mod socket;
