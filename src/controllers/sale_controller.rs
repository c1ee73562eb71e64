use uuid::Uuid;

use crate::dto::sale_dto::{InitializeSaleRequest, InitializeSaleResponse};
use crate::dto::vehicle_dto::ApiResponse;
use crate::queue::RedisQueueClient;
use crate::repositories::vehicle_repository::PgVehicleRepository;
use crate::services::vehicle_service::VehicleService;
use crate::state::AppState;
use crate::utils::errors::{validation_error, AppError};

pub struct SaleController {
    service: VehicleService<PgVehicleRepository, RedisQueueClient>,
}

impl SaleController {
    pub fn new(state: &AppState) -> Self {
        let repository = PgVehicleRepository::new(state.pool.clone());
        let service = VehicleService::new(
            repository,
            state.queue.clone(),
            state.config.sale_events_queue.clone(),
        );
        Self { service }
    }

    pub async fn initialize(
        &self,
        vehicle_id: Uuid,
        request: InitializeSaleRequest,
    ) -> Result<ApiResponse<InitializeSaleResponse>, AppError> {
        // Validar campos
        if request.user_id.trim().is_empty() {
            return Err(validation_error("user_id", "user_id is required"));
        }

        let idempotency_key = self
            .service
            .initialize_sale(vehicle_id, &request.user_id)
            .await?;

        Ok(ApiResponse::success(InitializeSaleResponse {
            idempotency_key,
        }))
    }

    pub async fn confirm(&self, vehicle_id: Uuid) -> Result<(), AppError> {
        self.service.confirm_sale(vehicle_id).await
    }

    pub async fn revert(&self, vehicle_id: Uuid) -> Result<(), AppError> {
        self.service.revert_sale(vehicle_id).await
    }
}
