/// 판매자 경매 관리
/// 1. 공개 여부 변경
/// 2. 경매 삭제 (입찰이 없고 비공개인 경우만)
// region:    --- Imports
use super::model::Auction;
use crate::error::{Error, Result};
use crate::store::AuctionStore;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Listing Service
pub struct ListingService {
    store: Arc<dyn AuctionStore>,
}

impl ListingService {
    pub fn new(store: Arc<dyn AuctionStore>) -> Self {
        Self { store }
    }

    /// 1. 공개 여부 변경
    pub async fn set_live(&self, auction_id: i64, seller_id: i64, is_live: bool) -> Result<Auction> {
        let (auction, _) = self.store.load_auction_with_bids(auction_id).await?;
        if auction.seller_id != seller_id {
            return Err(Error::NotSeller { auction_id });
        }
        let updated = self.store.set_live(auction_id, is_live).await?;
        info!(
            "{:<12} --> 공개 여부 변경: 경매 {}, is_live={}",
            "Listing", auction_id, is_live
        );
        Ok(updated)
    }

    /// 2. 경매 삭제
    pub async fn delete_auction(&self, auction_id: i64, seller_id: i64) -> Result<()> {
        let (auction, bids) = self.store.load_auction_with_bids(auction_id).await?;
        if auction.seller_id != seller_id {
            return Err(Error::NotSeller { auction_id });
        }
        if !bids.is_empty() {
            return Err(Error::HasBids { auction_id });
        }
        if auction.is_live {
            return Err(Error::StillLive { auction_id });
        }

        if self.store.delete_auction(auction_id).await? {
            info!("{:<12} --> 경매 삭제: {}", "Listing", auction_id);
            return Ok(());
        }

        // 확인 이후 입찰이 들어왔거나 다시 공개된 경우
        let (auction, bids) = self.store.load_auction_with_bids(auction_id).await?;
        if !bids.is_empty() {
            Err(Error::HasBids { auction_id })
        } else if auction.is_live {
            Err(Error::StillLive { auction_id })
        } else {
            Err(Error::TransientConflict { auction_id })
        }
    }
}
// endregion: --- Listing Service
