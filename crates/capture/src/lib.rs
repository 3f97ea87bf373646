#![doc = include_str!("../README.md")]

pub mod classifier;
pub mod config;
pub mod error;
pub mod session;
pub mod snapshot;
pub mod source;
pub mod store;

// --- 주요 타입 re-export ---

// 세션
pub use session::{CaptureSession, CaptureSessionBuilder, Progress};

// 설정
pub use config::SessionConfig;

// 소스
pub use source::{NetworkHeader, PacketSource, RawPacket, ReplaySource, TransportFlags};

// 집계
pub use store::AggregateStore;

// 스냅샷
pub use snapshot::{
    ExportView, ProtocolShare, SizeBucket, Snapshot, SnapshotContext, SnapshotExporter,
    TalkerEntry, TimePoint,
};

// 에러
pub use error::CaptureError;
