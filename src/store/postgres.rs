// region:    --- Imports
use super::queries;
use super::{AuctionStore, AuctionWithBids, StoreError};
use crate::auction::model::{Auction, AuctionStatus, Bid};
use crate::database::DatabaseManager;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Rows
#[derive(sqlx::FromRow)]
struct AuctionRow {
    id: i64,
    seller_id: i64,
    title: String,
    starting_bid: i64,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    is_live: bool,
    status: String,
    winner_id: Option<i64>,
    winning_bid: Option<i64>,
    winning_bid_id: Option<i64>,
    resolved_at: Option<DateTime<Utc>>,
    version: i64,
}

impl TryFrom<AuctionRow> for Auction {
    type Error = StoreError;

    fn try_from(row: AuctionRow) -> Result<Self, Self::Error> {
        Ok(Auction {
            id: row.id,
            seller_id: row.seller_id,
            title: row.title,
            starting_bid: row.starting_bid,
            start_time: row.start_time,
            end_time: row.end_time,
            is_live: row.is_live,
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            winner_id: row.winner_id,
            winning_bid: row.winning_bid,
            winning_bid_id: row.winning_bid_id,
            resolved_at: row.resolved_at,
            version: row.version,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BidRow {
    id: i64,
    auction_id: i64,
    bidder_id: i64,
    amount: i64,
    status: String,
    placed_at: DateTime<Utc>,
}

impl TryFrom<BidRow> for Bid {
    type Error = StoreError;

    fn try_from(row: BidRow) -> Result<Self, Self::Error> {
        Ok(Bid {
            id: row.id,
            auction_id: row.auction_id,
            bidder_id: row.bidder_id,
            amount: row.amount,
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            placed_at: row.placed_at,
        })
    }
}

fn into_bids(rows: Vec<BidRow>) -> Result<Vec<Bid>, StoreError> {
    rows.into_iter().map(Bid::try_from).collect()
}
// endregion: --- Rows

// region:    --- Postgres Store
/// PostgreSQL 경매 저장소
pub struct PostgresAuctionStore {
    db: Arc<DatabaseManager>,
}

impl PostgresAuctionStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// 경매 목록에 입찰을 붙여서 반환
    async fn attach_bids(&self, rows: Vec<AuctionRow>) -> Result<Vec<AuctionWithBids>, StoreError> {
        let auctions = rows
            .into_iter()
            .map(Auction::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let ids: Vec<i64> = auctions.iter().map(|a| a.id).collect();

        let bid_rows = sqlx::query_as::<_, BidRow>(queries::GET_BIDS_FOR_AUCTIONS)
            .bind(ids)
            .fetch_all(self.db.pool())
            .await?;

        let mut by_auction: HashMap<i64, Vec<Bid>> = HashMap::new();
        for bid in into_bids(bid_rows)? {
            by_auction.entry(bid.auction_id).or_default().push(bid);
        }

        Ok(auctions
            .into_iter()
            .map(|a| {
                let bids = by_auction.remove(&a.id).unwrap_or_default();
                (a, bids)
            })
            .collect())
    }
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn load_auction_with_bids(&self, auction_id: i64) -> Result<AuctionWithBids, StoreError> {
        debug!("{:<12} --> 경매 및 입찰 조회 id: {}", "Store", auction_id);
        let (auction_row, bid_rows) = self
            .db
            .transaction(|tx| {
                Box::pin(async move {
                    let auction_row = sqlx::query_as::<_, AuctionRow>(queries::GET_AUCTION)
                        .bind(auction_id)
                        .fetch_optional(&mut **tx)
                        .await?
                        .ok_or(StoreError::AuctionNotFound { auction_id })?;
                    let bid_rows = sqlx::query_as::<_, BidRow>(queries::GET_AUCTION_BIDS)
                        .bind(auction_id)
                        .fetch_all(&mut **tx)
                        .await?;
                    Ok::<_, StoreError>((auction_row, bid_rows))
                })
            })
            .await?;

        Ok((Auction::try_from(auction_row)?, into_bids(bid_rows)?))
    }

    async fn save_auction_status(
        &self,
        auction_id: i64,
        status: AuctionStatus,
    ) -> Result<(), StoreError> {
        sqlx::query(queries::UPDATE_AUCTION_STATUS)
            .bind(status.as_str())
            .bind(auction_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn save_auction_status_and_outcome(
        &self,
        auction: &Auction,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        let auction_id = auction.id;
        let status = auction.status.as_str();
        let winner_id = auction.winner_id;
        let winning_bid = auction.winning_bid;
        let winning_bid_id = auction.winning_bid_id;
        let resolved_at = auction.resolved_at;

        let new_version = self
            .db
            .transaction(|tx| {
                Box::pin(async move {
                    let updated = sqlx::query_scalar::<_, i64>(queries::UPDATE_AUCTION_OUTCOME)
                        .bind(status)
                        .bind(winner_id)
                        .bind(winning_bid)
                        .bind(winning_bid_id)
                        .bind(resolved_at)
                        .bind(auction_id)
                        .bind(expected_version)
                        .fetch_optional(&mut **tx)
                        .await?;

                    match updated {
                        Some(version) => Ok::<_, StoreError>(version),
                        None => {
                            let exists = sqlx::query_scalar::<_, bool>(queries::AUCTION_EXISTS)
                                .bind(auction_id)
                                .fetch_one(&mut **tx)
                                .await?;
                            if exists {
                                Err(StoreError::VersionConflict {
                                    auction_id,
                                    expected_version,
                                })
                            } else {
                                Err(StoreError::AuctionNotFound { auction_id })
                            }
                        }
                    }
                })
            })
            .await?;

        info!(
            "{:<12} --> 낙찰 결과 기록: 경매 {}, 버전 {}",
            "Store", auction_id, new_version
        );
        Ok(new_version)
    }

    async fn save_bid_statuses(&self, auction_id: i64, bids: &[Bid]) -> Result<u64, StoreError> {
        let updates: Vec<(i64, &'static str)> =
            bids.iter().map(|b| (b.id, b.status.as_str())).collect();

        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    let mut changed = 0;
                    for (bid_id, status) in updates {
                        changed += sqlx::query(queries::UPDATE_ACTIVE_BID_STATUS)
                            .bind(status)
                            .bind(bid_id)
                            .bind(auction_id)
                            .execute(&mut **tx)
                            .await?
                            .rows_affected();
                    }
                    Ok::<_, StoreError>(changed)
                })
            })
            .await
    }

    async fn list_live_auctions(&self) -> Result<Vec<AuctionWithBids>, StoreError> {
        let rows = sqlx::query_as::<_, AuctionRow>(queries::GET_LIVE_AUCTIONS)
            .fetch_all(self.db.pool())
            .await?;
        self.attach_bids(rows).await
    }

    async fn list_seller_auctions(&self, seller_id: i64) -> Result<Vec<AuctionWithBids>, StoreError> {
        let rows = sqlx::query_as::<_, AuctionRow>(queries::GET_SELLER_AUCTIONS)
            .bind(seller_id)
            .fetch_all(self.db.pool())
            .await?;
        self.attach_bids(rows).await
    }

    async fn list_bidder_auctions(&self, bidder_id: i64) -> Result<Vec<AuctionWithBids>, StoreError> {
        let rows = sqlx::query_as::<_, AuctionRow>(queries::GET_BIDDER_AUCTIONS)
            .bind(bidder_id)
            .fetch_all(self.db.pool())
            .await?;
        self.attach_bids(rows).await
    }

    async fn set_live(&self, auction_id: i64, is_live: bool) -> Result<Auction, StoreError> {
        let row = sqlx::query_as::<_, AuctionRow>(queries::UPDATE_AUCTION_LIVE)
            .bind(is_live)
            .bind(auction_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(StoreError::AuctionNotFound { auction_id })?;
        Auction::try_from(row)
    }

    async fn delete_auction(&self, auction_id: i64) -> Result<bool, StoreError> {
        self.db
            .transaction(|tx| {
                Box::pin(async move {
                    let exists = sqlx::query_scalar::<_, bool>(queries::AUCTION_EXISTS)
                        .bind(auction_id)
                        .fetch_one(&mut **tx)
                        .await?;
                    if !exists {
                        return Err(StoreError::AuctionNotFound { auction_id });
                    }
                    let deleted = sqlx::query(queries::DELETE_AUCTION_WITHOUT_BIDS)
                        .bind(auction_id)
                        .execute(&mut **tx)
                        .await?
                        .rows_affected();
                    Ok::<_, StoreError>(deleted == 1)
                })
            })
            .await
    }
}
// endregion: --- Postgres Store
