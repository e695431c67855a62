/// 경매 조회
pub const GET_AUCTION: &str = r#"
    SELECT id, seller_id, title, starting_bid, start_time, end_time, is_live, status,
           winner_id, winning_bid, winning_bid_id, resolved_at, version
    FROM auctions
    WHERE id = $1
"#;

/// 공개 경매 조회
pub const GET_LIVE_AUCTIONS: &str = r#"
    SELECT id, seller_id, title, starting_bid, start_time, end_time, is_live, status,
           winner_id, winning_bid, winning_bid_id, resolved_at, version
    FROM auctions
    WHERE is_live = TRUE
    ORDER BY created_at DESC
"#;

/// 판매자 경매 조회
pub const GET_SELLER_AUCTIONS: &str = r#"
    SELECT id, seller_id, title, starting_bid, start_time, end_time, is_live, status,
           winner_id, winning_bid, winning_bid_id, resolved_at, version
    FROM auctions
    WHERE seller_id = $1
    ORDER BY created_at DESC
"#;

/// 입찰자가 참여한 경매 조회
pub const GET_BIDDER_AUCTIONS: &str = r#"
    SELECT id, seller_id, title, starting_bid, start_time, end_time, is_live, status,
           winner_id, winning_bid, winning_bid_id, resolved_at, version
    FROM auctions a
    WHERE EXISTS (SELECT 1 FROM bids b WHERE b.auction_id = a.id AND b.bidder_id = $1)
    ORDER BY created_at DESC
"#;

/// 경매 입찰 조회
pub const GET_AUCTION_BIDS: &str = r#"
    SELECT id, auction_id, bidder_id, amount, status, placed_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY placed_at ASC, id ASC
"#;

/// 여러 경매의 입찰 조회
pub const GET_BIDS_FOR_AUCTIONS: &str = r#"
    SELECT id, auction_id, bidder_id, amount, status, placed_at
    FROM bids
    WHERE auction_id = ANY($1)
    ORDER BY placed_at ASC, id ASC
"#;

/// 캐시 상태 갱신 (값이 다를 때만)
pub const UPDATE_AUCTION_STATUS: &str =
    "UPDATE auctions SET status = $1 WHERE id = $2 AND status IS DISTINCT FROM $1";

/// 낙찰 결과 기록 (버전 및 미처리 조건)
pub const UPDATE_AUCTION_OUTCOME: &str = r#"
    UPDATE auctions
    SET status = $1, winner_id = $2, winning_bid = $3, winning_bid_id = $4,
        resolved_at = $5, version = version + 1
    WHERE id = $6 AND version = $7 AND resolved_at IS NULL AND winner_id IS NULL
    RETURNING version
"#;

/// 경매 존재 여부
pub const AUCTION_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM auctions WHERE id = $1)";

/// 활성 입찰 상태 변경
pub const UPDATE_ACTIVE_BID_STATUS: &str =
    "UPDATE bids SET status = $1 WHERE id = $2 AND auction_id = $3 AND status = 'ACTIVE'";

/// 공개 여부 변경
pub const UPDATE_AUCTION_LIVE: &str = r#"
    UPDATE auctions SET is_live = $1 WHERE id = $2
    RETURNING id, seller_id, title, starting_bid, start_time, end_time, is_live, status,
              winner_id, winning_bid, winning_bid_id, resolved_at, version
"#;

/// 입찰 없는 비공개 경매 삭제
pub const DELETE_AUCTION_WITHOUT_BIDS: &str = r#"
    DELETE FROM auctions
    WHERE id = $1 AND is_live = FALSE
      AND NOT EXISTS (SELECT 1 FROM bids WHERE auction_id = $1)
"#;
