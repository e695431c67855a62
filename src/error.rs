// region:    --- Imports
use crate::store::StoreError;
use chrono::{DateTime, Utc};

// endregion: --- Imports

// region:    --- Integrity Violations

/// 저장된 데이터가 모순될 때의 상세 사유
/// 자동으로 보정하지 않고 호출자(운영자)에게 그대로 전달한다.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrityViolation {
    #[error("경매 {auction_id}: 종료 시간({end_time})이 시작 시간({start_time}) 이후가 아닙니다")]
    InvalidTiming {
        auction_id: i64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    },

    #[error("경매 {auction_id}: 결제 완료 입찰이 여러 개입니다 {bid_ids:?}")]
    MultiplePaidBids { auction_id: i64, bid_ids: Vec<i64> },

    #[error("경매 {auction_id}: 결제 완료 입찰 {paid_bid_id}({paid_amount})보다 높은 활성 입찰 {active_bid_id}({active_amount})이 있습니다")]
    PaidBidOutbid {
        auction_id: i64,
        paid_bid_id: i64,
        paid_amount: i64,
        active_bid_id: i64,
        active_amount: i64,
    },

    #[error("경매 {auction_id}: 낙찰 필드가 일부만 기록되어 있습니다")]
    PartialOutcome { auction_id: i64 },

    #[error("경매 {auction_id}: 낙찰 입찰 {bid_id}을(를) 찾을 수 없습니다")]
    WinningBidMissing { auction_id: i64, bid_id: i64 },

    #[error("경매 {auction_id}: 기록된 낙찰 정보가 입찰 {bid_id}와 일치하지 않습니다")]
    WinningBidMismatch { auction_id: i64, bid_id: i64 },

    #[error("경매 {auction_id}: 낙찰 입찰이 아닌 입찰 {bid_id}이(가) 결제 완료 상태입니다")]
    PaidBidNotWinner { auction_id: i64, bid_id: i64 },

    #[error("경매 {auction_id}: 낙찰자 없이 종료되었으나 유효한 입찰 {bid_ids:?}이 남아 있습니다")]
    EligibleBidsWithoutWinner { auction_id: i64, bid_ids: Vec<i64> },

    #[error("경매 {auction_id}: 입찰 {bid_id}이(가) 다른 경매에 속해 있습니다")]
    ForeignBid { auction_id: i64, bid_id: i64 },

    #[error("경매 {auction_id}: 버전 충돌이 {attempts}회 재시도 후에도 해소되지 않았습니다")]
    ConflictNotResolved { auction_id: i64, attempts: u32 },

    #[error("읽을 수 없는 레코드: {0}")]
    UnreadableRecord(String),
}

// endregion: --- Integrity Violations

// region:    --- Error

/// 경매 평가 및 낙찰 처리 오류
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("데이터 무결성 오류: {0}")]
    DataIntegrity(#[from] IntegrityViolation),

    #[error("경매 {auction_id} 동시 저장 충돌")]
    TransientConflict { auction_id: i64 },

    #[error("경매를 찾을 수 없습니다: {auction_id}")]
    NotFound { auction_id: i64 },

    #[error("아직 종료되지 않은 경매입니다: {auction_id}")]
    NotClosed { auction_id: i64 },

    #[error("입찰이 있는 경매는 삭제할 수 없습니다: {auction_id}")]
    HasBids { auction_id: i64 },

    #[error("진행 중(공개) 경매는 삭제할 수 없습니다: {auction_id}")]
    StillLive { auction_id: i64 },

    #[error("경매 {auction_id}의 판매자가 아닙니다")]
    NotSeller { auction_id: i64 },

    #[error("저장소 오류: {0}")]
    Persistence(String),
}

impl Error {
    /// 응답에 쓰는 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            Error::DataIntegrity(_) => "DATA_INTEGRITY",
            Error::TransientConflict { .. } => "TRANSIENT_CONFLICT",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::NotClosed { .. } => "NOT_CLOSED",
            Error::HasBids { .. } => "HAS_BIDS",
            Error::StillLive { .. } => "STILL_LIVE",
            Error::NotSeller { .. } => "NOT_SELLER",
            Error::Persistence(_) => "PERSISTENCE",
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::VersionConflict { auction_id, .. } => Error::TransientConflict { auction_id },
            StoreError::AuctionNotFound { auction_id } => Error::NotFound { auction_id },
            StoreError::Corrupt(msg) => Error::DataIntegrity(IntegrityViolation::UnreadableRecord(msg)),
            StoreError::Database(e) => Error::Persistence(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// endregion: --- Error
