use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum AuctionEvent {
    // 낙찰 처리 완료 이벤트 (낙찰자가 없으면 winner_id, winning_bid 가 비어 있음)
    AuctionResolved {
        auction_id: i64,
        winner_id: Option<i64>,
        winning_bid: Option<i64>,
        timestamp: DateTime<Utc>,
    },
}

impl AuctionEvent {
    pub fn auction_id(&self) -> i64 {
        match self {
            AuctionEvent::AuctionResolved { auction_id, .. } => *auction_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            AuctionEvent::AuctionResolved { .. } => "AuctionResolved",
        }
    }
}
