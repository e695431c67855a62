#![allow(dead_code)]

use async_trait::async_trait;
use auction_resolution_service::auction::events::AuctionEvent;
use auction_resolution_service::auction::model::{Auction, AuctionStatus, Bid, BidStatus};
use auction_resolution_service::clock::FixedClock;
use auction_resolution_service::config::ResolutionConfig;
use auction_resolution_service::handlers::AppState;
use auction_resolution_service::notifier::{Notifier, NotifyError};
use auction_resolution_service::store::{
    AuctionStore, AuctionWithBids, InMemoryAuctionStore, StoreError,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// 트레이싱 초기화 (여러 테스트에서 호출해도 안전)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// 기준 종료 시각 T
pub fn deadline() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// T 에 종료되는 테스트용 경매
pub fn test_auction(id: i64, seller_id: i64) -> Auction {
    Auction {
        id,
        seller_id,
        title: format!("테스트 경매 {}", id),
        starting_bid: 10,
        start_time: deadline() - Duration::hours(2),
        end_time: deadline(),
        is_live: true,
        status: AuctionStatus::Scheduled,
        winner_id: None,
        winning_bid: None,
        winning_bid_id: None,
        resolved_at: None,
        version: 0,
    }
}

/// T 기준 secs_before_end 초 전에 들어온 입찰
pub fn test_bid(
    id: i64,
    auction_id: i64,
    bidder_id: i64,
    amount: i64,
    status: BidStatus,
    secs_before_end: i64,
) -> Bid {
    Bid {
        id,
        auction_id,
        bidder_id,
        amount,
        status,
        placed_at: deadline() - Duration::seconds(secs_before_end),
    }
}

/// 동점 입찰: A $100 (T-10), B $150 (T-5), C $150 (T-3)
pub async fn seed_tied_bids(store: &InMemoryAuctionStore, auction_id: i64, c_status: BidStatus) {
    store.insert_auction(test_auction(auction_id, 1)).await;
    store
        .insert_bid(test_bid(auction_id * 100 + 1, auction_id, 101, 100, BidStatus::Active, 10))
        .await;
    store
        .insert_bid(test_bid(auction_id * 100 + 2, auction_id, 102, 150, BidStatus::Active, 5))
        .await;
    store
        .insert_bid(test_bid(auction_id * 100 + 3, auction_id, 103, 150, c_status, 3))
        .await;
}

/// 발행된 이벤트를 기록하는 알림 구현체
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<AuctionEvent>>,
}

impl RecordingNotifier {
    pub async fn events(&self) -> Vec<AuctionEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), NotifyError> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

/// 항상 실패하는 알림 구현체
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn publish(&self, _event: &AuctionEvent) -> Result<(), NotifyError> {
        Err(NotifyError::Kafka("broker unavailable".to_string()))
    }
}

/// 충돌/장애를 주입하는 저장소
pub struct FlakyStore {
    pub inner: Arc<InMemoryAuctionStore>,
    /// 남은 버전 충돌 주입 횟수
    pub outcome_conflicts: AtomicU32,
    pub fail_status_cache: bool,
}

impl FlakyStore {
    pub fn new(inner: Arc<InMemoryAuctionStore>, outcome_conflicts: u32) -> Self {
        Self {
            inner,
            outcome_conflicts: AtomicU32::new(outcome_conflicts),
            fail_status_cache: false,
        }
    }
}

#[async_trait]
impl AuctionStore for FlakyStore {
    async fn load_auction_with_bids(&self, auction_id: i64) -> Result<AuctionWithBids, StoreError> {
        self.inner.load_auction_with_bids(auction_id).await
    }

    async fn save_auction_status(
        &self,
        auction_id: i64,
        status: AuctionStatus,
    ) -> Result<(), StoreError> {
        if self.fail_status_cache {
            return Err(StoreError::Corrupt("status cache unavailable".to_string()));
        }
        self.inner.save_auction_status(auction_id, status).await
    }

    async fn save_auction_status_and_outcome(
        &self,
        auction: &Auction,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        let injected = self
            .outcome_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::VersionConflict {
                auction_id: auction.id,
                expected_version,
            });
        }
        self.inner
            .save_auction_status_and_outcome(auction, expected_version)
            .await
    }

    async fn save_bid_statuses(&self, auction_id: i64, bids: &[Bid]) -> Result<u64, StoreError> {
        self.inner.save_bid_statuses(auction_id, bids).await
    }

    async fn list_live_auctions(&self) -> Result<Vec<AuctionWithBids>, StoreError> {
        self.inner.list_live_auctions().await
    }

    async fn list_seller_auctions(&self, seller_id: i64) -> Result<Vec<AuctionWithBids>, StoreError> {
        self.inner.list_seller_auctions(seller_id).await
    }

    async fn list_bidder_auctions(&self, bidder_id: i64) -> Result<Vec<AuctionWithBids>, StoreError> {
        self.inner.list_bidder_auctions(bidder_id).await
    }

    async fn set_live(&self, auction_id: i64, is_live: bool) -> Result<Auction, StoreError> {
        self.inner.set_live(auction_id, is_live).await
    }

    async fn delete_auction(&self, auction_id: i64) -> Result<bool, StoreError> {
        self.inner.delete_auction(auction_id).await
    }
}

/// 테스트 구성
pub struct Harness {
    pub store: Arc<InMemoryAuctionStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<FixedClock>,
    pub state: AppState,
}

/// 메모리 저장소 기반 구성 (시계는 T+1초)
pub fn harness() -> Harness {
    harness_with(ResolutionConfig::default())
}

pub fn harness_with(config: ResolutionConfig) -> Harness {
    let store = Arc::new(InMemoryAuctionStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = Arc::new(FixedClock::new(deadline() + Duration::seconds(1)));
    let state = AppState::new(store.clone(), notifier.clone(), clock.clone(), config);
    Harness {
        store,
        notifier,
        clock,
        state,
    }
}
