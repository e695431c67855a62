// region:    --- Imports
use crate::auction::evaluator::{AuctionEvaluator, Evaluation};
use crate::auction::listing::ListingService;
use crate::auction::resolution::ResolutionEngine;
use crate::clock::Clock;
use crate::config::ResolutionConfig;
use crate::error::Error;
use crate::notifier::Notifier;
use crate::store::AuctionStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

// endregion: --- Imports

// region:    --- App State
#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<AuctionEvaluator>,
    pub listing: Arc<ListingService>,
}

impl AppState {
    /// 저장소, 알림, 시계를 묶어 평가기와 관리 서비스를 구성
    pub fn new(
        store: Arc<dyn AuctionStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: ResolutionConfig,
    ) -> Self {
        let engine = ResolutionEngine::new(
            Arc::clone(&store),
            notifier,
            Arc::clone(&clock),
            config,
        );
        Self {
            evaluator: Arc::new(AuctionEvaluator::new(Arc::clone(&store), engine, clock)),
            listing: Arc::new(ListingService::new(store)),
        }
    }
}

/// 라우터 설정
pub fn routes(state: AppState) -> Router {
    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auctions", get(handle_get_live_auctions))
        .route(
            "/auctions/:id",
            get(handle_get_auction).delete(handle_delete_auction),
        )
        .route("/auctions/:id/live", post(handle_set_live))
        .route("/sellers/:id/auctions", get(handle_get_seller_auctions))
        .route("/bidders/:id/bids", get(handle_get_bidder_bids))
        .layer(cors)
        .with_state(state)
}
// endregion: --- App State

// region:    --- Error Response
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::NotSeller { .. } => StatusCode::FORBIDDEN,
            Error::TransientConflict { .. }
            | Error::NotClosed { .. }
            | Error::HasBids { .. }
            | Error::StillLive { .. } => StatusCode::CONFLICT,
            Error::DataIntegrity(_) | Error::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(serde_json::json!({
                "error": self.to_string(),
                "code": self.code(),
            })),
        )
            .into_response()
    }
}

/// 목록 응답 (평가 실패한 경매는 오류 정보로 대체)
fn listing_response(results: Vec<(i64, crate::error::Result<Evaluation>)>) -> Response {
    let entries: Vec<serde_json::Value> = results
        .into_iter()
        .map(|(auction_id, result)| match result {
            Ok(evaluation) => serde_json::to_value(evaluation).unwrap_or_else(|e| {
                serde_json::json!({
                    "auction_id": auction_id,
                    "error": e.to_string(),
                    "code": "SERIALIZATION",
                })
            }),
            Err(e) => serde_json::json!({
                "auction_id": auction_id,
                "error": e.to_string(),
                "code": e.code(),
            }),
        })
        .collect();
    Json(entries).into_response()
}
// endregion: --- Error Response

// region:    --- Query Handlers

/// 공개 경매 목록 조회
pub async fn handle_get_live_auctions(State(state): State<AppState>) -> Response {
    info!("{:<12} --> 공개 경매 목록 조회", "Handler");
    match state.evaluator.evaluate_live().await {
        Ok(results) => listing_response(results),
        Err(e) => e.into_response(),
    }
}

/// 경매 상세 조회
pub async fn handle_get_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Response {
    info!("{:<12} --> 경매 조회 id: {}", "Handler", auction_id);
    match state.evaluator.evaluate_by_id(auction_id).await {
        Ok(evaluation) => Json(evaluation).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 판매자 경매 목록 조회
pub async fn handle_get_seller_auctions(
    State(state): State<AppState>,
    Path(seller_id): Path<i64>,
) -> Response {
    info!("{:<12} --> 판매자 경매 목록 조회 id: {}", "Handler", seller_id);
    match state.evaluator.evaluate_seller(seller_id).await {
        Ok(results) => listing_response(results),
        Err(e) => e.into_response(),
    }
}

/// 입찰자 입찰 내역 조회
pub async fn handle_get_bidder_bids(
    State(state): State<AppState>,
    Path(bidder_id): Path<i64>,
) -> Response {
    info!("{:<12} --> 입찰자 입찰 내역 조회 id: {}", "Handler", bidder_id);
    match state.evaluator.evaluate_bidder(bidder_id).await {
        Ok(results) => listing_response(results),
        Err(e) => e.into_response(),
    }
}

// endregion: --- Query Handlers

// region:    --- Command Handlers

/// 공개 여부 변경 요청
#[derive(Debug, Deserialize)]
pub struct SetLiveRequest {
    pub seller_id: i64,
    pub is_live: bool,
}

/// 경매 삭제 요청
#[derive(Debug, Deserialize)]
pub struct DeleteAuctionRequest {
    pub seller_id: i64,
}

/// 공개 여부 변경
pub async fn handle_set_live(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    Json(req): Json<SetLiveRequest>,
) -> Response {
    info!(
        "{:<12} --> 공개 여부 변경 요청: 경매 {}, {:?}",
        "Handler", auction_id, req
    );
    match state
        .listing
        .set_live(auction_id, req.seller_id, req.is_live)
        .await
    {
        Ok(auction) => Json(auction).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 경매 삭제
pub async fn handle_delete_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    Json(req): Json<DeleteAuctionRequest>,
) -> Response {
    info!("{:<12} --> 경매 삭제 요청: {}", "Handler", auction_id);
    match state.listing.delete_auction(auction_id, req.seller_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "경매가 삭제되었습니다.",
                "auction_id": auction_id,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

// endregion: --- Command Handlers
