/// 경매 상태 판정
/// 상태는 저장하지 않고 (now, start_time, end_time) 으로부터 매번 계산한다.
// region:    --- Imports
use super::model::{Auction, AuctionStatus};
use crate::error::IntegrityViolation;
use chrono::{DateTime, Utc};

// endregion: --- Imports

// region:    --- Status Derivation

/// 시간 필드 검증 (end_time > start_time)
pub fn validate_timing(auction: &Auction) -> Result<(), IntegrityViolation> {
    if auction.end_time <= auction.start_time {
        return Err(IntegrityViolation::InvalidTiming {
            auction_id: auction.id,
            start_time: auction.start_time,
            end_time: auction.end_time,
        });
    }
    Ok(())
}

/// 상태 계산
pub fn derive_status(
    auction: &Auction,
    now: DateTime<Utc>,
) -> Result<AuctionStatus, IntegrityViolation> {
    validate_timing(auction)?;

    let status = if now < auction.start_time {
        AuctionStatus::Scheduled
    } else if now < auction.end_time {
        AuctionStatus::Active
    } else {
        AuctionStatus::Closed
    };
    Ok(status)
}

// endregion: --- Status Derivation

// endregion: --- Tests
