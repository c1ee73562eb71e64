use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::sale_controller::SaleController;
use crate::dto::sale_dto::{InitializeSaleRequest, InitializeSaleResponse};
use crate::dto::vehicle_dto::ApiResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_sale_router() -> Router<AppState> {
    Router::new()
        .route("/:vehicle_id/initialize", post(initialize_sale))
        .route("/:vehicle_id/confirm", post(confirm_sale))
        .route("/:vehicle_id/revert", post(revert_sale))
}

async fn initialize_sale(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
    Json(request): Json<InitializeSaleRequest>,
) -> Result<Json<ApiResponse<InitializeSaleResponse>>, AppError> {
    let controller = SaleController::new(&state);
    let response = controller.initialize(vehicle_id, request).await?;
    Ok(Json(response))
}

async fn confirm_sale(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = SaleController::new(&state);
    controller.confirm(vehicle_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Venta confirmada exitosamente"
    })))
}

async fn revert_sale(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = SaleController::new(&state);
    controller.revert(vehicle_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Venta revertida exitosamente"
    })))
}
