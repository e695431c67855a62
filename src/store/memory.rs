// region:    --- Imports
use super::{AuctionStore, AuctionWithBids, StoreError};
use crate::auction::model::{Auction, AuctionStatus, Bid, BidStatus};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::debug;

// endregion: --- Imports

// region:    --- In-Memory Store
#[derive(Default)]
struct Inner {
    auctions: BTreeMap<i64, Auction>,
    bids: BTreeMap<i64, Bid>,
    outcome_writes: u64,
    bid_status_writes: u64,
}

impl Inner {
    fn bids_of(&self, auction_id: i64) -> Vec<Bid> {
        self.bids
            .values()
            .filter(|b| b.auction_id == auction_id)
            .cloned()
            .collect()
    }
}

/// 메모리 저장소
/// 하나의 잠금으로 모든 쓰기를 직렬화한다. 테스트와 로컬 실행용.
#[derive(Default)]
pub struct InMemoryAuctionStore {
    inner: Mutex<Inner>,
}

impl InMemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 경매 추가 (기존 id 는 덮어씀)
    pub async fn insert_auction(&self, auction: Auction) {
        self.inner.lock().await.auctions.insert(auction.id, auction);
    }

    /// 입찰 추가
    pub async fn insert_bid(&self, bid: Bid) {
        self.inner.lock().await.bids.insert(bid.id, bid);
    }

    /// 외부 결제 흐름 등이 입찰 상태를 직접 바꾸는 경우
    pub async fn set_bid_status(&self, bid_id: i64, status: BidStatus) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let bid = inner
            .bids
            .get_mut(&bid_id)
            .ok_or_else(|| StoreError::Corrupt(format!("입찰 없음: {}", bid_id)))?;
        bid.status = status;
        Ok(())
    }

    /// 성공한 낙찰 결과 기록 횟수
    pub async fn outcome_writes(&self) -> u64 {
        self.inner.lock().await.outcome_writes
    }

    /// 실제로 변경된 입찰 상태 수 (누적)
    pub async fn bid_status_writes(&self) -> u64 {
        self.inner.lock().await.bid_status_writes
    }
}

#[async_trait]
impl AuctionStore for InMemoryAuctionStore {
    async fn load_auction_with_bids(&self, auction_id: i64) -> Result<AuctionWithBids, StoreError> {
        let inner = self.inner.lock().await;
        let auction = inner
            .auctions
            .get(&auction_id)
            .cloned()
            .ok_or(StoreError::AuctionNotFound { auction_id })?;
        Ok((auction, inner.bids_of(auction_id)))
    }

    async fn save_auction_status(
        &self,
        auction_id: i64,
        status: AuctionStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let auction = inner
            .auctions
            .get_mut(&auction_id)
            .ok_or(StoreError::AuctionNotFound { auction_id })?;
        auction.status = status;
        Ok(())
    }

    async fn save_auction_status_and_outcome(
        &self,
        auction: &Auction,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().await;
        let stored = inner
            .auctions
            .get_mut(&auction.id)
            .ok_or(StoreError::AuctionNotFound {
                auction_id: auction.id,
            })?;

        if stored.version != expected_version || stored.is_resolved() {
            return Err(StoreError::VersionConflict {
                auction_id: auction.id,
                expected_version,
            });
        }

        stored.status = auction.status;
        stored.winner_id = auction.winner_id;
        stored.winning_bid = auction.winning_bid;
        stored.winning_bid_id = auction.winning_bid_id;
        stored.resolved_at = auction.resolved_at;
        stored.version = expected_version + 1;
        let new_version = stored.version;
        inner.outcome_writes += 1;

        debug!(
            "{:<12} --> 낙찰 결과 기록: 경매 {}, 버전 {}",
            "Store", auction.id, new_version
        );
        Ok(new_version)
    }

    async fn save_bid_statuses(&self, auction_id: i64, bids: &[Bid]) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let mut changed = 0;
        for bid in bids {
            if let Some(stored) = inner.bids.get_mut(&bid.id) {
                if stored.auction_id == auction_id && stored.status == BidStatus::Active {
                    stored.status = bid.status;
                    changed += 1;
                }
            }
        }
        inner.bid_status_writes += changed;
        Ok(changed)
    }

    async fn list_live_auctions(&self) -> Result<Vec<AuctionWithBids>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .auctions
            .values()
            .filter(|a| a.is_live)
            .map(|a| (a.clone(), inner.bids_of(a.id)))
            .collect())
    }

    async fn list_seller_auctions(&self, seller_id: i64) -> Result<Vec<AuctionWithBids>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .auctions
            .values()
            .filter(|a| a.seller_id == seller_id)
            .map(|a| (a.clone(), inner.bids_of(a.id)))
            .collect())
    }

    async fn list_bidder_auctions(&self, bidder_id: i64) -> Result<Vec<AuctionWithBids>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .auctions
            .values()
            .map(|a| (a.clone(), inner.bids_of(a.id)))
            .filter(|(_, bids)| bids.iter().any(|b| b.bidder_id == bidder_id))
            .collect())
    }

    async fn set_live(&self, auction_id: i64, is_live: bool) -> Result<Auction, StoreError> {
        let mut inner = self.inner.lock().await;
        let auction = inner
            .auctions
            .get_mut(&auction_id)
            .ok_or(StoreError::AuctionNotFound { auction_id })?;
        auction.is_live = is_live;
        Ok(auction.clone())
    }

    async fn delete_auction(&self, auction_id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let deletable = match inner.auctions.get(&auction_id) {
            Some(auction) => !auction.is_live && inner.bids_of(auction_id).is_empty(),
            None => return Err(StoreError::AuctionNotFound { auction_id }),
        };
        if deletable {
            inner.auctions.remove(&auction_id);
        }
        Ok(deletable)
    }
}
// endregion: --- In-Memory Store
