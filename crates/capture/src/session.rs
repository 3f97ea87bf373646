//! 캡처 세션 — 인제스트 루프와 정지 조건
//!
//! [`CaptureSession`]은 소스에서 패킷을 pull하여 분류/집계하고,
//! 네 가지 정지 조건(개수 도달, 시간 초과, 스트림 종료/소스 에러,
//! 수동 중단) 중 하나로 종료한 뒤 최종 스냅샷을 반환합니다.
//!
//! 집계 스토어는 세션이 단독 소유하므로 잠금이 없습니다. 외부
//! 관찰자는 비차단 진행 채널([`Progress`])이나 진행 중 스냅샷으로만
//! 상태를 봅니다.

use std::time::SystemTime;

use metrics::counter;
use packetlens_core::metrics as m;
use packetlens_core::types::{CaptureReason, PacketRecord};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classifier::classify;
use crate::config::SessionConfig;
use crate::error::CaptureError;
use crate::snapshot::{Snapshot, SnapshotContext};
use crate::source::PacketSource;
use crate::store::AggregateStore;

/// 패킷 하나가 집계된 직후 발행되는 진행 알림
#[derive(Debug, Clone)]
pub struct Progress {
    /// 방금 집계된 레코드
    pub record: PacketRecord,
    /// 이 레코드를 포함한 누적 패킷 수
    pub total_count: u64,
}

/// 캡처 세션 빌더
///
/// 진행 채널은 선택 사항입니다. [`CaptureSessionBuilder::build`]는
/// 세션과 함께 수신단을 반환하며, 진행 채널을 켜지 않으면 `None`입니다.
#[derive(Debug)]
pub struct CaptureSessionBuilder {
    config: SessionConfig,
    progress: bool,
}

impl CaptureSessionBuilder {
    /// 설정으로 빌더를 생성합니다.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            progress: false,
        }
    }

    /// 진행 알림 채널을 활성화합니다.
    pub fn with_progress(mut self) -> Self {
        self.progress = true;
        self
    }

    /// 세션을 생성합니다. 설정이 유효하지 않으면 실패합니다.
    pub fn build(self) -> Result<(CaptureSession, Option<mpsc::Receiver<Progress>>), CaptureError> {
        self.config.validate()?;

        let (progress_tx, progress_rx) = if self.progress {
            let (tx, rx) = mpsc::channel(self.config.progress_channel_capacity);
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        let session = CaptureSession {
            session_id: Uuid::new_v4(),
            config: self.config,
            store: AggregateStore::new(),
            progress_tx,
            progress_dropped: 0,
            cancel: CancellationToken::new(),
        };
        Ok((session, progress_rx))
    }
}

/// 캡처 세션
pub struct CaptureSession {
    session_id: Uuid,
    config: SessionConfig,
    store: AggregateStore,
    progress_tx: Option<mpsc::Sender<Progress>>,
    progress_dropped: u64,
    cancel: CancellationToken,
}

impl CaptureSession {
    /// 빌더를 생성합니다.
    pub fn builder(config: SessionConfig) -> CaptureSessionBuilder {
        CaptureSessionBuilder::new(config)
    }

    /// 세션 식별자를 반환합니다.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// 수동 중단 토큰을 반환합니다.
    ///
    /// 토큰을 취소하면 세션은 현재 패킷 경계에서 `ManualStop`으로
    /// 종료합니다. 이미 집계된 레코드는 보존됩니다.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 채널이 가득 차 드롭된 진행 알림 수를 반환합니다.
    pub fn progress_dropped(&self) -> u64 {
        self.progress_dropped
    }

    /// 진행 중 스냅샷을 생성합니다. 종료 사유는 아직 없습니다.
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot(&SnapshotContext {
            session_id: self.session_id.to_string(),
            session_end: None,
            reason: None,
            failure: None,
            histogram_bins: self.config.histogram_bins,
        })
    }

    /// 인제스트 루프를 실행하고 최종 스냅샷을 반환합니다.
    ///
    /// 시간 제한은 이 호출 시점부터 측정됩니다. 소스 에러가 나도
    /// 부분 결과는 버려지지 않고 `reason = Error`인 스냅샷으로
    /// 반환됩니다.
    pub async fn run<S: PacketSource>(&mut self, mut source: S) -> Snapshot {
        let deadline = Instant::now() + self.config.max_duration;
        info!(
            session_id = %self.session_id,
            source = source.name(),
            max_packets = self.config.max_packets,
            max_duration_secs = self.config.max_duration.as_secs(),
            "capture session started"
        );

        let mut failure: Option<String> = None;
        let reason = loop {
            // 패킷 경계에서 먼저 확인하는 정지 조건
            if self.store.total_count() >= self.config.max_packets {
                break CaptureReason::CountReached;
            }
            if self.cancel.is_cancelled() {
                break CaptureReason::ManualStop;
            }

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    break CaptureReason::ManualStop;
                }
                _ = tokio::time::sleep_until(deadline) => {
                    break CaptureReason::Timeout;
                }
                next = source.next_packet() => match next {
                    Ok(Some(raw)) => self.ingest(raw),
                    Ok(None) => {
                        debug!(session_id = %self.session_id, "source reported end of stream");
                        break CaptureReason::EndOfStream;
                    }
                    Err(err) => {
                        warn!(
                            session_id = %self.session_id,
                            error = %err,
                            "source failed, finishing with partial results"
                        );
                        failure = Some(err.to_string());
                        break CaptureReason::Error;
                    }
                },
            }
        };

        counter!(m::CAPTURE_SESSIONS_TOTAL, m::LABEL_REASON => reason.as_str()).increment(1);
        info!(
            session_id = %self.session_id,
            reason = %reason,
            total_count = self.store.total_count(),
            total_bytes = self.store.total_bytes(),
            progress_dropped = self.progress_dropped,
            "capture session finished"
        );

        self.store.snapshot(&SnapshotContext {
            session_id: self.session_id.to_string(),
            session_end: Some(SystemTime::now()),
            reason: Some(reason),
            failure,
            histogram_bins: self.config.histogram_bins,
        })
    }

    fn ingest(&mut self, raw: crate::source::RawPacket) {
        let sequence = self.store.total_count() + 1;
        let record = classify(&raw, sequence, SystemTime::now());
        self.notify(&record, sequence);
        self.store.update(record);
    }

    /// 진행 알림을 비차단으로 발행합니다.
    ///
    /// 채널이 가득 차면 알림을 드롭하고 카운트만 올립니다. 수신단이
    /// 닫혀 있으면 발신단을 버리고 이후 알림을 생략합니다.
    fn notify(&mut self, record: &PacketRecord, total_count: u64) {
        let Some(tx) = &self.progress_tx else {
            return;
        };

        match tx.try_send(Progress {
            record: record.clone(),
            total_count,
        }) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.progress_dropped += 1;
                counter!(m::CAPTURE_PROGRESS_DROPPED_TOTAL).increment(1);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(session_id = %self.session_id, "progress receiver closed, disabling notifications");
                self.progress_tx = None;
            }
        }
    }
}
