//! 경매 저장소
//!
//! 평가기와 낙찰 엔진이 사용하는 좁은 저장소 인터페이스.
//! 낙찰 결과 기록은 경매 id 와 버전을 조건으로 하는 비교 후 교체(CAS)이며,
//! 같은 경매를 동시에 처리하는 요청 중 하나만 성공한다.

// region:    --- Modules
mod memory;
mod postgres;
mod queries;

pub use memory::InMemoryAuctionStore;
pub use postgres::PostgresAuctionStore;
// endregion: --- Modules

// region:    --- Imports
use crate::auction::model::{Auction, AuctionStatus, Bid};
use async_trait::async_trait;

// endregion: --- Imports

// region:    --- Store Error
/// 저장소 오류
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 낙관적 동시성 충돌. 다른 요청이 먼저 경매를 갱신했다.
    #[error("버전 충돌: 경매 {auction_id}, 기대 버전 {expected_version}")]
    VersionConflict {
        auction_id: i64,
        expected_version: i64,
    },

    #[error("경매를 찾을 수 없습니다: {auction_id}")]
    AuctionNotFound { auction_id: i64 },

    /// 저장된 값을 도메인 타입으로 읽을 수 없음
    #[error("잘못된 레코드: {0}")]
    Corrupt(String),

    #[error("데이터베이스 오류: {0}")]
    Database(#[from] sqlx::Error),
}
// endregion: --- Store Error

// region:    --- Auction Store Trait
pub type AuctionWithBids = (Auction, Vec<Bid>);

/// 경매 저장소 트레이트
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// 경매와 입찰 전체 조회
    async fn load_auction_with_bids(&self, auction_id: i64) -> Result<AuctionWithBids, StoreError>;

    /// 캐시된 상태 기록 (판단 근거가 아니므로 실패해도 무방)
    async fn save_auction_status(
        &self,
        auction_id: i64,
        status: AuctionStatus,
    ) -> Result<(), StoreError>;

    /// 상태와 낙찰 결과를 함께 기록
    ///
    /// `version == expected_version` 이고 아직 낙찰 처리되지 않은 경우에만 기록한다.
    /// 조건이 맞지 않으면 `StoreError::VersionConflict` 를 반환한다.
    /// 성공 시 증가된 새 버전을 반환한다.
    async fn save_auction_status_and_outcome(
        &self,
        auction: &Auction,
        expected_version: i64,
    ) -> Result<i64, StoreError>;

    /// 입찰 상태 기록
    ///
    /// 현재 `ACTIVE` 인 입찰만 전이시키므로 여러 번 호출해도 결과가 같다.
    /// 실제로 변경된 입찰 수를 반환한다.
    async fn save_bid_statuses(&self, auction_id: i64, bids: &[Bid]) -> Result<u64, StoreError>;

    /// 공개(is_live) 경매 목록
    async fn list_live_auctions(&self) -> Result<Vec<AuctionWithBids>, StoreError>;

    /// 판매자의 경매 목록
    async fn list_seller_auctions(&self, seller_id: i64) -> Result<Vec<AuctionWithBids>, StoreError>;

    /// 입찰자가 입찰한 경매 목록 (입찰은 경매별 전체)
    async fn list_bidder_auctions(&self, bidder_id: i64) -> Result<Vec<AuctionWithBids>, StoreError>;

    /// 공개 여부 변경
    async fn set_live(&self, auction_id: i64, is_live: bool) -> Result<Auction, StoreError>;

    /// 입찰이 없고 비공개인 경매만 삭제. 조건이 맞지 않으면 false.
    async fn delete_auction(&self, auction_id: i64) -> Result<bool, StoreError>;
}
// endregion: --- Auction Store Trait
