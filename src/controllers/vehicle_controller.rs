use uuid::Uuid;

use crate::dto::vehicle_dto::{
    ApiResponse, RegisterVehicleRequest, UpdateVehicleRequest, VehicleResponse,
};
use crate::queue::RedisQueueClient;
use crate::repositories::vehicle_repository::PgVehicleRepository;
use crate::services::vehicle_service::VehicleService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct VehicleController {
    service: VehicleService<PgVehicleRepository, RedisQueueClient>,
}

impl VehicleController {
    pub fn new(state: &AppState) -> Self {
        let repository = PgVehicleRepository::new(state.pool.clone());
        let service = VehicleService::new(
            repository,
            state.queue.clone(),
            state.config.sale_events_queue.clone(),
        );
        Self { service }
    }

    pub async fn register(
        &self,
        request: RegisterVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        let vehicle = self.service.register(request).await?;

        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(vehicle),
            "Vehículo registrado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<VehicleResponse, AppError> {
        let vehicle = self.service.get(id).await?;
        Ok(VehicleResponse::from(vehicle))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        let vehicle = self.service.update(id, request).await?;

        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(vehicle),
            "Vehículo actualizado exitosamente".to_string(),
        ))
    }

    pub async fn list_available(&self) -> Result<Vec<VehicleResponse>, AppError> {
        let vehicles = self.service.list_available().await?;
        Ok(vehicles.into_iter().map(VehicleResponse::from).collect())
    }

    pub async fn list_sold(&self) -> Result<Vec<VehicleResponse>, AppError> {
        let vehicles = self.service.list_sold().await?;
        Ok(vehicles.into_iter().map(VehicleResponse::from).collect())
    }
}
