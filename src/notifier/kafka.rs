// region:    --- Imports
use super::{Notifier, NotifyError};
use crate::auction::events::AuctionEvent;
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Kafka Producer
#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
    brokers: String,
}

/// KafkaProducer 구현
impl KafkaProducer {
    pub fn new(brokers: &str) -> Result<Self, NotifyError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| NotifyError::Kafka(format!("Producer 생성 실패: {:?}", e)))?;

        Ok(KafkaProducer {
            producer: Arc::new(producer),
            brokers: brokers.to_string(),
        })
    }

    /// 메시지 전송
    pub async fn send_message(&self, topic: &str, key: &str, value: &str) -> Result<(), NotifyError> {
        info!(
            "{:<12} --> Kafka 메시지 전송: topic={}, key={}",
            "Producer", topic, key
        );
        let record = FutureRecord::to(topic).key(key).payload(value);

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| NotifyError::Kafka(format!("Error sending message: {:?}", e)))?;

        Ok(())
    }

    /// 토픽 생성 (이미 있으면 성공으로 처리)
    pub async fn create_topic(
        &self,
        topic_name: &str,
        num_partitions: i32,
        replication_factor: i32,
    ) -> Result<(), NotifyError> {
        info!("{:<12} --> Kafka 토픽 생성 시작: {}", "Producer", topic_name);

        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()
            .map_err(|e| NotifyError::Kafka(format!("AdminClient 생성 실패: {:?}", e)))?;

        let new_topic = NewTopic::new(
            topic_name,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );

        let results = admin_client
            .create_topics(&[new_topic], &AdminOptions::new())
            .await
            .map_err(|e| {
                error!("{:<12} --> Kafka 토픽 생성 실패: {:?}", "Producer", e);
                NotifyError::Kafka(format!("토픽 생성 실패: {:?}", e))
            })?;

        for result in results {
            match result {
                Ok(_) | Err((_, RDKafkaErrorCode::TopicAlreadyExists)) => {}
                Err((topic, code)) => {
                    return Err(NotifyError::Kafka(format!(
                        "토픽 생성 실패: {} ({:?})",
                        topic, code
                    )))
                }
            }
        }
        info!("{:<12} --> Kafka 토픽 준비 완료: {}", "Producer", topic_name);
        Ok(())
    }
}

// endregion: --- Kafka Producer

// region:    --- Kafka Notifier
/// 낙찰 이벤트를 Kafka 토픽으로 발행
pub struct KafkaNotifier {
    producer: KafkaProducer,
    topic: String,
}

impl KafkaNotifier {
    pub fn new(producer: KafkaProducer, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl Notifier for KafkaNotifier {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(event)?;
        info!(
            "{:<12} --> {} 이벤트 발행: 경매 {}",
            "Notifier",
            event.event_type(),
            event.auction_id()
        );
        self.producer
            .send_message(&self.topic, &event.auction_id().to_string(), &payload)
            .await
    }
}
// endregion: --- Kafka Notifier
