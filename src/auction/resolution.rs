//! 낙찰 처리 엔진
//!
//! 종료된 경매의 입찰 중 하나를 정해진 우선순위로 선택하고, 그 결과를 경매당 한 번만 기록한다.
//!
//! 선택 규칙 (먼저 맞는 규칙 적용):
//! 1. 결제 완료(PAID) 입찰이 있으면 그 입찰이 낙찰. 둘 이상이면 무결성 오류.
//! 2. 활성(ACTIVE) 입찰 중 금액이 가장 큰 입찰. 금액이 같으면 먼저 넣은 입찰,
//!    입찰 시각까지 같으면 id 가 작은 입찰.
//! 3. 해당 입찰이 없으면 낙찰자 없이 종료.
//!
//! 결과 기록은 버전 조건부 갱신이라 동시에 여러 요청이 처리해도 한 번만 성공한다.
//! 결과 기록 후 패찰 처리 전에 중단되면, 다음 평가 때 기존 결과를 유지한 채 패찰 처리를 마저 한다.

// region:    --- Imports
use super::events::AuctionEvent;
use super::model::{Auction, AuctionStatus, Bid, BidStatus, Outcome};
use super::status::{derive_status, validate_timing};
use crate::clock::Clock;
use crate::config::{PaidBidPolicy, ResolutionConfig};
use crate::error::{Error, IntegrityViolation, Result};
use crate::notifier::Notifier;
use crate::store::{AuctionStore, StoreError};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Winner Selection

/// 활성 입찰 순위 비교. Less 가 더 높은 순위.
fn rank(a: &Bid, b: &Bid) -> Ordering {
    b.amount
        .cmp(&a.amount)
        .then_with(|| a.placed_at.cmp(&b.placed_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// 가장 높은 순위의 활성 입찰
fn highest_active_bid(bids: &[Bid]) -> Option<&Bid> {
    bids.iter()
        .filter(|b| b.status == BidStatus::Active)
        .min_by(|a, b| rank(a, b))
}

/// 낙찰 입찰 선택
pub fn select_winner(
    auction: &Auction,
    bids: &[Bid],
    policy: PaidBidPolicy,
) -> std::result::Result<Outcome, IntegrityViolation> {
    if let Some(foreign) = bids.iter().find(|b| b.auction_id != auction.id) {
        return Err(IntegrityViolation::ForeignBid {
            auction_id: auction.id,
            bid_id: foreign.id,
        });
    }

    let paid: Vec<&Bid> = bids.iter().filter(|b| b.status == BidStatus::Paid).collect();
    match paid.as_slice() {
        [] => {}
        [paid_bid] => {
            if policy == PaidBidPolicy::Verify {
                if let Some(active) = highest_active_bid(bids) {
                    if active.amount > paid_bid.amount {
                        return Err(IntegrityViolation::PaidBidOutbid {
                            auction_id: auction.id,
                            paid_bid_id: paid_bid.id,
                            paid_amount: paid_bid.amount,
                            active_bid_id: active.id,
                            active_amount: active.amount,
                        });
                    }
                }
            }
            return Ok(Outcome::from_bid(paid_bid));
        }
        many => {
            return Err(IntegrityViolation::MultiplePaidBids {
                auction_id: auction.id,
                bid_ids: many.iter().map(|b| b.id).collect(),
            })
        }
    }

    Ok(highest_active_bid(bids)
        .map(Outcome::from_bid)
        .unwrap_or_else(Outcome::no_winner))
}

/// 패찰 처리할 입찰 (낙찰 입찰을 제외한 활성 입찰)
pub fn losing_bids(outcome: &Outcome, bids: &[Bid]) -> Vec<Bid> {
    bids.iter()
        .filter(|b| b.status == BidStatus::Active && Some(b.id) != outcome.winning_bid_id)
        .map(|b| Bid {
            status: BidStatus::Lost,
            ..b.clone()
        })
        .collect()
}

/// 이미 기록된 낙찰 결과가 입찰 데이터와 맞는지 확인
pub fn verify_stored_outcome(
    auction: &Auction,
    bids: &[Bid],
) -> std::result::Result<Outcome, IntegrityViolation> {
    let outcome = auction.outcome();
    let auction_id = auction.id;

    match (outcome.winner_id, outcome.winning_bid, outcome.winning_bid_id) {
        (Some(winner_id), Some(amount), Some(bid_id)) => {
            let bid = bids
                .iter()
                .find(|b| b.id == bid_id)
                .ok_or(IntegrityViolation::WinningBidMissing { auction_id, bid_id })?;
            let consistent = bid.bidder_id == winner_id
                && bid.amount == amount
                && matches!(bid.status, BidStatus::Active | BidStatus::Paid);
            if !consistent {
                return Err(IntegrityViolation::WinningBidMismatch { auction_id, bid_id });
            }
            if let Some(other) = bids
                .iter()
                .find(|b| b.status == BidStatus::Paid && b.id != bid_id)
            {
                return Err(IntegrityViolation::PaidBidNotWinner {
                    auction_id,
                    bid_id: other.id,
                });
            }
        }
        (None, None, None) => {
            let eligible: Vec<i64> = bids
                .iter()
                .filter(|b| matches!(b.status, BidStatus::Active | BidStatus::Paid))
                .map(|b| b.id)
                .collect();
            if !eligible.is_empty() {
                return Err(IntegrityViolation::EligibleBidsWithoutWinner {
                    auction_id,
                    bid_ids: eligible,
                });
            }
        }
        _ => return Err(IntegrityViolation::PartialOutcome { auction_id }),
    }

    Ok(outcome)
}

// endregion: --- Winner Selection

// region:    --- Resolution Engine

/// 낙찰 처리 결과
#[derive(Debug, Clone)]
pub struct Resolution {
    pub auction: Auction,
    pub bids: Vec<Bid>,
    pub outcome: Outcome,
    /// 이번 호출에서 결과를 처음 기록했는지 여부
    pub newly_resolved: bool,
}

/// 낙찰 처리 엔진
pub struct ResolutionEngine {
    store: Arc<dyn AuctionStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: ResolutionConfig,
}

impl ResolutionEngine {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: ResolutionConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            config,
        }
    }

    /// 낙찰 처리
    ///
    /// 이미 처리된 경매라면 다시 계산하지 않고 기록된 결과를 반환하며,
    /// 남아 있는 패찰 처리만 마저 한다.
    /// 버전 충돌 시 경매를 다시 읽어 `max_retries` 회까지 재시도한다.
    pub async fn resolve(&self, auction: Auction, bids: Vec<Bid>) -> Result<Resolution> {
        let auction_id = auction.id;
        let mut snapshot = (auction, bids);
        let mut conflicts: u32 = 0;

        loop {
            let (mut auction, mut bids) = snapshot;
            validate_timing(&auction)?;

            if auction.is_resolved() {
                let outcome = verify_stored_outcome(&auction, &bids)?;
                self.settle_losing_bids(&auction, &outcome, &mut bids).await?;
                return Ok(Resolution {
                    auction,
                    bids,
                    outcome,
                    newly_resolved: false,
                });
            }

            let now = self.clock.now();
            if derive_status(&auction, now)? != AuctionStatus::Closed {
                return Err(Error::NotClosed { auction_id });
            }

            let outcome = select_winner(&auction, &bids, self.config.paid_bid_policy).map_err(|e| {
                error!("{:<12} --> 낙찰 선택 실패: {}", "Resolver", e);
                e
            })?;

            let expected_version = auction.version;
            auction.status = AuctionStatus::Closed;
            auction.winner_id = outcome.winner_id;
            auction.winning_bid = outcome.winning_bid;
            auction.winning_bid_id = outcome.winning_bid_id;
            auction.resolved_at = Some(now);

            match self
                .store
                .save_auction_status_and_outcome(&auction, expected_version)
                .await
            {
                Ok(new_version) => {
                    auction.version = new_version;
                    if outcome.has_winner() {
                        info!(
                            "{:<12} --> 낙찰 처리 완료: 경매 {}, 낙찰자 {:?}, 낙찰가 {:?}",
                            "Resolver", auction_id, outcome.winner_id, outcome.winning_bid
                        );
                    } else {
                        info!("{:<12} --> 유찰 처리 완료: 경매 {}", "Resolver", auction_id);
                    }
                    self.notify(&auction, now).await;
                    self.settle_losing_bids(&auction, &outcome, &mut bids).await?;
                    return Ok(Resolution {
                        auction,
                        bids,
                        outcome,
                        newly_resolved: true,
                    });
                }
                Err(StoreError::VersionConflict { .. }) => {
                    conflicts = conflicts.saturating_add(1);
                    if conflicts > self.config.max_retries {
                        error!(
                            "{:<12} --> 버전 충돌 재시도 초과: 경매 {}",
                            "Resolver", auction_id
                        );
                        return Err(IntegrityViolation::ConflictNotResolved {
                            auction_id,
                            attempts: conflicts,
                        }
                        .into());
                    }
                    warn!(
                        "{:<12} --> 낙관적 업데이트로 인한 버전 충돌: 재시도 ({}/{})",
                        "Resolver", conflicts, self.config.max_retries
                    );
                    snapshot = self.store.load_auction_with_bids(auction_id).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// 남아 있는 활성 패찰 입찰을 LOST 로 전이
    async fn settle_losing_bids(
        &self,
        auction: &Auction,
        outcome: &Outcome,
        bids: &mut [Bid],
    ) -> Result<u64> {
        let losers = losing_bids(outcome, bids);
        if losers.is_empty() {
            return Ok(0);
        }

        let changed = self.store.save_bid_statuses(auction.id, &losers).await?;
        for bid in bids.iter_mut() {
            if losers.iter().any(|l| l.id == bid.id) {
                bid.status = BidStatus::Lost;
            }
        }
        info!(
            "{:<12} --> 패찰 처리: 경매 {}, {}건",
            "Resolver", auction.id, changed
        );
        Ok(changed)
    }

    /// 낙찰 알림 발행 (실패해도 처리 결과에는 영향 없음)
    async fn notify(&self, auction: &Auction, now: chrono::DateTime<chrono::Utc>) {
        let event = AuctionEvent::AuctionResolved {
            auction_id: auction.id,
            winner_id: auction.winner_id,
            winning_bid: auction.winning_bid,
            timestamp: now,
        };
        if let Err(e) = self.notifier.publish(&event).await {
            warn!(
                "{:<12} --> 낙찰 알림 발행 실패: 경매 {}, {}",
                "Resolver", auction.id, e
            );
        }
    }
}

// endregion: --- Resolution Engine

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn auction() -> Auction {
        Auction {
            id: 7,
            seller_id: 1,
            title: "빈티지 카메라".to_string(),
            starting_bid: 50,
            start_time: end() - Duration::hours(1),
            end_time: end(),
            is_live: true,
            status: AuctionStatus::Active,
            winner_id: None,
            winning_bid: None,
            winning_bid_id: None,
            resolved_at: None,
            version: 0,
        }
    }

    fn bid(id: i64, bidder_id: i64, amount: i64, status: BidStatus, secs_before_end: i64) -> Bid {
        Bid {
            id,
            auction_id: 7,
            bidder_id,
            amount,
            status,
            placed_at: end() - Duration::seconds(secs_before_end),
        }
    }

    #[test]
    fn equal_amounts_go_to_the_earlier_bid() {
        let bids = vec![
            bid(1, 100, 100, BidStatus::Active, 10),
            bid(3, 300, 150, BidStatus::Active, 3),
            bid(2, 200, 150, BidStatus::Active, 5),
        ];
        let outcome = select_winner(&auction(), &bids, PaidBidPolicy::Trust).unwrap();
        assert_eq!(outcome.winner_id, Some(200));
        assert_eq!(outcome.winning_bid, Some(150));
        assert_eq!(outcome.winning_bid_id, Some(2));
    }

    #[test]
    fn identical_timestamps_fall_back_to_bid_id() {
        let bids = vec![
            bid(9, 900, 150, BidStatus::Active, 5),
            bid(4, 400, 150, BidStatus::Active, 5),
        ];
        let outcome = select_winner(&auction(), &bids, PaidBidPolicy::Trust).unwrap();
        assert_eq!(outcome.winning_bid_id, Some(4));
    }

    #[test]
    fn withdrawn_and_lost_bids_are_not_eligible() {
        let bids = vec![
            bid(1, 100, 500, BidStatus::Withdrawn, 10),
            bid(2, 200, 400, BidStatus::Lost, 9),
        ];
        let outcome = select_winner(&auction(), &bids, PaidBidPolicy::Trust).unwrap();
        assert_eq!(outcome, Outcome::no_winner());
    }

    #[test]
    fn verify_policy_rejects_outbid_paid_bid() {
        let bids = vec![
            bid(1, 100, 100, BidStatus::Paid, 10),
            bid(2, 200, 150, BidStatus::Active, 5),
        ];
        assert_eq!(
            select_winner(&auction(), &bids, PaidBidPolicy::Trust)
                .unwrap()
                .winning_bid_id,
            Some(1)
        );
        let err = select_winner(&auction(), &bids, PaidBidPolicy::Verify).unwrap_err();
        assert!(matches!(
            err,
            IntegrityViolation::PaidBidOutbid {
                paid_bid_id: 1,
                active_bid_id: 2,
                ..
            }
        ));
    }

    #[test]
    fn bids_from_other_auctions_are_rejected() {
        let mut stray = bid(5, 500, 10, BidStatus::Active, 1);
        stray.auction_id = 8;
        let err = select_winner(&auction(), &[stray], PaidBidPolicy::Trust).unwrap_err();
        assert!(matches!(err, IntegrityViolation::ForeignBid { bid_id: 5, .. }));
    }

    #[test]
    fn losing_bids_skip_winner_paid_and_withdrawn() {
        let bids = vec![
            bid(1, 100, 100, BidStatus::Active, 10),
            bid(2, 200, 150, BidStatus::Active, 5),
            bid(3, 300, 90, BidStatus::Withdrawn, 4),
        ];
        let outcome = Outcome::from_bid(&bids[1]);
        let losers = losing_bids(&outcome, &bids);
        assert_eq!(losers.len(), 1);
        assert_eq!(losers[0].id, 1);
        assert_eq!(losers[0].status, BidStatus::Lost);
    }

    #[test]
    fn stored_outcome_must_match_bid_data() {
        let bids = vec![bid(2, 200, 150, BidStatus::Active, 5)];
        let mut a = auction();
        a.resolved_at = Some(end());
        a.winner_id = Some(200);
        a.winning_bid = Some(150);
        a.winning_bid_id = Some(2);
        assert!(verify_stored_outcome(&a, &bids).is_ok());

        a.winning_bid = Some(175);
        assert!(matches!(
            verify_stored_outcome(&a, &bids),
            Err(IntegrityViolation::WinningBidMismatch { bid_id: 2, .. })
        ));

        a.winning_bid = None;
        assert!(matches!(
            verify_stored_outcome(&a, &bids),
            Err(IntegrityViolation::PartialOutcome { .. })
        ));

        a.winning_bid = Some(150);
        a.winning_bid_id = Some(99);
        assert!(matches!(
            verify_stored_outcome(&a, &bids),
            Err(IntegrityViolation::WinningBidMissing { bid_id: 99, .. })
        ));
    }

    #[test]
    fn no_winner_outcome_with_active_bids_is_contradictory() {
        let mut a = auction();
        a.resolved_at = Some(end());
        let bids = vec![bid(1, 100, 100, BidStatus::Active, 10)];
        assert!(matches!(
            verify_stored_outcome(&a, &bids),
            Err(IntegrityViolation::EligibleBidsWithoutWinner { .. })
        ));
        assert_eq!(verify_stored_outcome(&a, &[]).unwrap(), Outcome::no_winner());
    }
}
// endregion: --- Tests
