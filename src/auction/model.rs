use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// region:    --- Status Types

/// 경매 진행 상태 (시간으로부터 파생되는 값)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Scheduled,
    Active,
    Closed,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Scheduled => "SCHEDULED",
            AuctionStatus::Active => "ACTIVE",
            AuctionStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuctionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(AuctionStatus::Scheduled),
            "ACTIVE" => Ok(AuctionStatus::Active),
            "CLOSED" => Ok(AuctionStatus::Closed),
            other => Err(format!("알 수 없는 경매 상태: {}", other)),
        }
    }
}

/// 입찰 상태
/// Paid 는 외부 결제 흐름만 기록하고, Lost 는 낙찰 처리에서만 기록한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BidStatus {
    Active,
    Paid,
    Withdrawn,
    Lost,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Active => "ACTIVE",
            BidStatus::Paid => "PAID",
            BidStatus::Withdrawn => "WITHDRAWN",
            BidStatus::Lost => "LOST",
        }
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BidStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(BidStatus::Active),
            "PAID" => Ok(BidStatus::Paid),
            "WITHDRAWN" => Ok(BidStatus::Withdrawn),
            "LOST" => Ok(BidStatus::Lost),
            other => Err(format!("알 수 없는 입찰 상태: {}", other)),
        }
    }
}

// endregion: --- Status Types

// region:    --- Models

/// 경매 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub starting_bid: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_live: bool,
    /// 캐시된 상태. 판단 근거로 쓰지 않는다.
    pub status: AuctionStatus,
    pub winner_id: Option<i64>,
    pub winning_bid: Option<i64>,
    pub winning_bid_id: Option<i64>,
    /// 낙찰 처리 완료 표시 (낙찰자 없는 종료 포함)
    pub resolved_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl Auction {
    /// 낙찰 처리가 끝났는지 여부
    pub fn is_resolved(&self) -> bool {
        self.winner_id.is_some() || self.resolved_at.is_some()
    }

    /// 저장된 낙찰 결과
    pub fn outcome(&self) -> Outcome {
        Outcome {
            winner_id: self.winner_id,
            winning_bid: self.winning_bid,
            winning_bid_id: self.winning_bid_id,
        }
    }
}

/// 입찰 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub status: BidStatus,
    pub placed_at: DateTime<Utc>,
}

/// 낙찰 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub winner_id: Option<i64>,
    pub winning_bid: Option<i64>,
    pub winning_bid_id: Option<i64>,
}

impl Outcome {
    /// 낙찰자 없이 종료
    pub fn no_winner() -> Self {
        Self::default()
    }

    pub fn from_bid(bid: &Bid) -> Self {
        Self {
            winner_id: Some(bid.bidder_id),
            winning_bid: Some(bid.amount),
            winning_bid_id: Some(bid.id),
        }
    }

    pub fn has_winner(&self) -> bool {
        self.winner_id.is_some()
    }
}

// endregion: --- Models
