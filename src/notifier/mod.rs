/// 낙찰 결과 알림
/// 알림은 낙찰 처리의 정확성과 무관하므로, 실패해도 기록만 하고 넘어간다.
// region:    --- Modules
mod kafka;

pub use kafka::{KafkaNotifier, KafkaProducer};
// endregion: --- Modules

// region:    --- Imports
use crate::auction::events::AuctionEvent;
use async_trait::async_trait;
use tracing::info;

// endregion: --- Imports

// region:    --- Notifier
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Kafka 오류: {0}")]
    Kafka(String),

    #[error("이벤트 직렬화 오류: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 알림 발송 트레이트
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), NotifyError>;
}

/// 로그로만 남기는 알림 구현체
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), NotifyError> {
        info!(
            "{:<12} --> 알림 {}: {:?}",
            "Notifier",
            event.event_type(),
            event
        );
        Ok(())
    }
}
// endregion: --- Notifier
