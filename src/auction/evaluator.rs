/// 경매 상태 평가기
/// 경매를 읽는 모든 요청은 평가기를 거친다.
/// 상태는 매번 계산하고, 종료되었지만 아직 낙찰 처리되지 않은 경매는 그 자리에서 낙찰 처리한다.
// region:    --- Imports
use super::model::{Auction, AuctionStatus, Bid, BidStatus, Outcome};
use super::resolution::{verify_stored_outcome, ResolutionEngine};
use super::status::derive_status;
use crate::clock::Clock;
use crate::error::Result;
use crate::store::{AuctionStore, AuctionWithBids};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

// endregion: --- Imports

// region:    --- Evaluation
/// 평가 결과
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub auction: Auction,
    pub bids: Vec<Bid>,
    pub status: AuctionStatus,
    /// 이번 평가에서 낙찰 처리를 시작했는지 여부
    pub resolution_triggered: bool,
    /// 종료된 경매의 낙찰 결과
    pub outcome: Option<Outcome>,
}

/// 낙찰 처리 후 아직 ACTIVE 로 남은 패찰 입찰이 있는지
fn has_unsettled_losers(auction: &Auction, bids: &[Bid]) -> bool {
    bids.iter()
        .any(|b| b.status == BidStatus::Active && Some(b.id) != auction.winning_bid_id)
}
// endregion: --- Evaluation

// region:    --- Auction Evaluator
pub struct AuctionEvaluator {
    store: Arc<dyn AuctionStore>,
    engine: ResolutionEngine,
    clock: Arc<dyn Clock>,
}

impl AuctionEvaluator {
    pub fn new(store: Arc<dyn AuctionStore>, engine: ResolutionEngine, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            engine,
            clock,
        }
    }

    /// 경매 평가
    pub async fn evaluate(&self, mut auction: Auction, bids: Vec<Bid>) -> Result<Evaluation> {
        let now = self.clock.now();
        let status = derive_status(&auction, now)?;
        self.refresh_status_cache(&auction, status).await;
        auction.status = status;

        if status != AuctionStatus::Closed {
            return Ok(Evaluation {
                auction,
                bids,
                status,
                resolution_triggered: false,
                outcome: None,
            });
        }

        let unresolved = !auction.is_resolved();
        if unresolved || has_unsettled_losers(&auction, &bids) {
            if unresolved {
                info!(
                    "{:<12} --> 종료된 경매 낙찰 처리 시작: {}",
                    "Evaluator", auction.id
                );
            } else {
                warn!(
                    "{:<12} --> 패찰 처리가 덜 된 경매 복구: {}",
                    "Evaluator", auction.id
                );
            }
            let resolution = self.engine.resolve(auction, bids).await?;
            return Ok(Evaluation {
                auction: resolution.auction,
                bids: resolution.bids,
                status,
                resolution_triggered: unresolved,
                outcome: Some(resolution.outcome),
            });
        }

        let outcome = verify_stored_outcome(&auction, &bids)?;
        Ok(Evaluation {
            auction,
            bids,
            status,
            resolution_triggered: false,
            outcome: Some(outcome),
        })
    }

    /// id 로 경매를 읽어 평가
    pub async fn evaluate_by_id(&self, auction_id: i64) -> Result<Evaluation> {
        let (auction, bids) = self.store.load_auction_with_bids(auction_id).await?;
        self.evaluate(auction, bids).await
    }

    /// 공개 경매 전체 평가
    pub async fn evaluate_live(&self) -> Result<Vec<(i64, Result<Evaluation>)>> {
        let auctions = self.store.list_live_auctions().await?;
        Ok(self.evaluate_all(auctions).await)
    }

    /// 판매자 경매 전체 평가
    pub async fn evaluate_seller(&self, seller_id: i64) -> Result<Vec<(i64, Result<Evaluation>)>> {
        let auctions = self.store.list_seller_auctions(seller_id).await?;
        Ok(self.evaluate_all(auctions).await)
    }

    /// 입찰자가 참여한 경매 평가
    ///
    /// 낙찰 처리는 경매의 전체 입찰로 하고, 응답에는 해당 입찰자의 입찰만 남긴다.
    pub async fn evaluate_bidder(&self, bidder_id: i64) -> Result<Vec<(i64, Result<Evaluation>)>> {
        let auctions = self.store.list_bidder_auctions(bidder_id).await?;
        let results = self.evaluate_all(auctions).await;
        Ok(results
            .into_iter()
            .map(|(auction_id, result)| {
                let result = result.map(|mut evaluation| {
                    evaluation.bids.retain(|b| b.bidder_id == bidder_id);
                    evaluation
                });
                (auction_id, result)
            })
            .collect())
    }

    /// 경매별로 평가. 한 경매의 오류가 다른 경매 결과를 가리지 않는다.
    async fn evaluate_all(&self, auctions: Vec<AuctionWithBids>) -> Vec<(i64, Result<Evaluation>)> {
        let mut results = Vec::with_capacity(auctions.len());
        for (auction, bids) in auctions {
            let auction_id = auction.id;
            let result = self.evaluate(auction, bids).await;
            if let Err(e) = &result {
                warn!("{:<12} --> 경매 {} 평가 실패: {}", "Evaluator", auction_id, e);
            }
            results.push((auction_id, result));
        }
        results
    }

    /// 상태 캐시 갱신 (실패해도 요청은 계속 진행)
    async fn refresh_status_cache(&self, auction: &Auction, status: AuctionStatus) {
        if auction.status == status {
            return;
        }
        match self.store.save_auction_status(auction.id, status).await {
            Ok(()) => debug!(
                "{:<12} --> 상태 캐시 갱신: 경매 {} {} -> {}",
                "Evaluator", auction.id, auction.status, status
            ),
            Err(e) => warn!(
                "{:<12} --> 상태 캐시 갱신 실패: 경매 {}, {}",
                "Evaluator", auction.id, e
            ),
        }
    }
}
// endregion: --- Auction Evaluator
