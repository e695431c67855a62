//! PostgreSQL 저장소 테스트
//! DATABASE_URL 이 필요하므로 기본 실행에서 제외: `cargo test -- --ignored`
mod common;

use auction_resolution_service::auction::model::{AuctionStatus, BidStatus};
use auction_resolution_service::clock::FixedClock;
use auction_resolution_service::config::ResolutionConfig;
use auction_resolution_service::database::DatabaseManager;
use auction_resolution_service::handlers::AppState;
use auction_resolution_service::store::{AuctionStore, PostgresAuctionStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use common::*;
use std::sync::Arc;

/// 데이터베이스 매니저 설정
async fn setup() -> Arc<DatabaseManager> {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db_manager = DatabaseManager::connect(&database_url, 5)
        .await
        .expect("Failed to create pool");
    db_manager
        .initialize_database()
        .await
        .expect("스키마 생성 실패");
    Arc::new(db_manager)
}

/// 테스트용 경매 생성
async fn create_test_auction(
    db_manager: &DatabaseManager,
    seller_id: i64,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> i64 {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, i64>(
                    "INSERT INTO auctions (seller_id, title, starting_bid, start_time, end_time, is_live, status)
                     VALUES ($1, $2, $3, $4, $5, TRUE, 'SCHEDULED')
                     RETURNING id",
                )
                .bind(seller_id)
                .bind("PostgreSQL 테스트 경매")
                .bind(10_i64)
                .bind(start_time)
                .bind(end_time)
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}

/// 테스트용 입찰 생성
async fn create_test_bid(
    db_manager: &DatabaseManager,
    auction_id: i64,
    bidder_id: i64,
    amount: i64,
    status: BidStatus,
    placed_at: DateTime<Utc>,
) -> i64 {
    let status = status.as_str();
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, i64>(
                    "INSERT INTO bids (auction_id, bidder_id, amount, status, placed_at)
                     VALUES ($1, $2, $3, $4, $5)
                     RETURNING id",
                )
                .bind(auction_id)
                .bind(bidder_id)
                .bind(amount)
                .bind(status)
                .bind(placed_at)
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}

/// 동시 평가 시 PostgreSQL 에서도 낙찰 결과는 한 번만 기록
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_postgres_concurrent_resolution() {
    init_tracing();
    let db_manager = setup().await;
    let now = Utc::now();
    let end = now - Duration::seconds(1);
    let auction_id = create_test_auction(&db_manager, 1, end - Duration::hours(1), end).await;
    let a = create_test_bid(&db_manager, auction_id, 11, 100, BidStatus::Active, end - Duration::seconds(10)).await;
    let b = create_test_bid(&db_manager, auction_id, 12, 150, BidStatus::Active, end - Duration::seconds(5)).await;
    let c = create_test_bid(&db_manager, auction_id, 13, 150, BidStatus::Active, end - Duration::seconds(3)).await;

    let store = Arc::new(PostgresAuctionStore::new(Arc::clone(&db_manager)));
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState::new(
        store.clone(),
        notifier.clone(),
        Arc::new(FixedClock::new(now)),
        ResolutionConfig {
            max_retries: 50,
            ..ResolutionConfig::default()
        },
    );

    let mut handles = vec![];
    for _ in 0..10 {
        let evaluator = Arc::clone(&state.evaluator);
        handles.push(tokio::spawn(async move {
            evaluator.evaluate_by_id(auction_id).await
        }));
    }
    for handle in handles {
        let evaluation = handle.await.unwrap().unwrap();
        assert_eq!(evaluation.outcome.unwrap().winning_bid_id, Some(b));
    }

    let (auction, bids) = store.load_auction_with_bids(auction_id).await.unwrap();
    assert_eq!(auction.status, AuctionStatus::Closed);
    assert_eq!(auction.winner_id, Some(12));
    assert_eq!(auction.version, 1);
    for bid in bids {
        if bid.id == a || bid.id == c {
            assert_eq!(bid.status, BidStatus::Lost);
        } else {
            assert_eq!(bid.status, BidStatus::Active);
        }
    }
    assert_eq!(notifier.events().await.len(), 1);
}

/// 버전 조건이 맞지 않으면 충돌 오류
#[tokio::test]
#[ignore]
async fn test_postgres_outcome_write_is_guarded() {
    let db_manager = setup().await;
    let end = Utc::now() - Duration::minutes(1);
    let auction_id = create_test_auction(&db_manager, 2, end - Duration::hours(1), end).await;
    let store = PostgresAuctionStore::new(Arc::clone(&db_manager));

    let (mut auction, _) = store.load_auction_with_bids(auction_id).await.unwrap();
    auction.status = AuctionStatus::Closed;
    auction.resolved_at = Some(Utc::now());

    let version = store
        .save_auction_status_and_outcome(&auction, 0)
        .await
        .unwrap();
    assert_eq!(version, 1);

    let err = store
        .save_auction_status_and_outcome(&auction, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::VersionConflict { .. }));

    let err = store
        .save_auction_status_and_outcome(&auction, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::VersionConflict { .. }));
}
