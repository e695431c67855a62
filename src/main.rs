// region:    --- Imports
use auction_resolution_service::clock::SystemClock;
use auction_resolution_service::config::{AppConfig, ConfigError, NotifierKind, StoreBackend};
use auction_resolution_service::database::DatabaseManager;
use auction_resolution_service::handlers::{self, AppState};
use auction_resolution_service::notifier::{KafkaNotifier, KafkaProducer, LogNotifier, Notifier};
use auction_resolution_service::store::{AuctionStore, InMemoryAuctionStore, PostgresAuctionStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;
    info!(
        "{:<12} --> 설정 로드: store={:?}, notifier={:?}, resolution={:?}",
        "Main", config.store_backend, config.notifier, config.resolution
    );

    // 저장소 생성
    let store: Arc<dyn AuctionStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let db_manager =
                Arc::new(DatabaseManager::connect(database_url, config.database_max_connections).await?);

            // 데이터베이스 초기화
            if let Err(e) = db_manager.initialize_database().await {
                error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
                return Err(e.into());
            }
            info!("{:<12} --> 데이터베이스 초기화 성공", "Main");
            Arc::new(PostgresAuctionStore::new(db_manager))
        }
        StoreBackend::Memory => {
            warn!("{:<12} --> 메모리 저장소 사용 (재시작 시 데이터 유실)", "Main");
            Arc::new(InMemoryAuctionStore::new())
        }
    };

    // 알림 발행자 생성
    let notifier: Arc<dyn Notifier> = match config.notifier {
        NotifierKind::Kafka => {
            let producer = KafkaProducer::new(&config.kafka_brokers)?;
            // 토픽 준비 실패는 경고만 남김
            if let Err(e) = producer.create_topic(&config.notification_topic, 5, 1).await {
                warn!("{:<12} --> 알림 토픽 준비 실패: {}", "Main", e);
            }
            info!("{:<12} --> Kafka 알림 발행자 준비 완료", "Main");
            Arc::new(KafkaNotifier::new(producer, config.notification_topic.clone()))
        }
        NotifierKind::Log => Arc::new(LogNotifier),
    };

    let state = AppState::new(store, notifier, Arc::new(SystemClock), config.resolution);
    let routes_all = handlers::routes(state);

    // 리스너 생성
    let listener = TcpListener::bind(config.bind_addr.as_str()).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
