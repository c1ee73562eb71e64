//! Servicio de vehículos
//!
//! Este módulo contiene la lógica de negocio y la máquina de estados de la
//! venta: available → draft → sold. `sold` es terminal; draft puede
//! confirmarse o revertirse. El servicio no toma locks propios: la unicidad
//! del registro de venta en el storage es el respaldo ante carreras.

use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::vehicle_dto::{RegisterVehicleRequest, UpdateVehicleRequest};
use crate::models::sale::SaleRecord;
use crate::models::vehicle::Vehicle;
use crate::queue::{SaleEventQueue, SaleInitiatedEvent};
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::AppError;

pub struct VehicleService<R, Q> {
    repository: R,
    queue: Q,
    queue_name: String,
}

impl<R: VehicleRepository, Q: SaleEventQueue> VehicleService<R, Q> {
    pub fn new(repository: R, queue: Q, queue_name: String) -> Self {
        Self {
            repository,
            queue,
            queue_name,
        }
    }

    /// Registrar un nuevo vehículo
    pub async fn register(&self, data: RegisterVehicleRequest) -> Result<Vehicle, AppError> {
        let vehicle = Vehicle::new(data.brand_name, data.model, data.year, data.color, data.price)?;
        self.repository.save(&vehicle).await
    }

    /// Actualizar un vehículo existente (reemplazo completo de campos)
    pub async fn update(
        &self,
        vehicle_id: Uuid,
        data: UpdateVehicleRequest,
    ) -> Result<Vehicle, AppError> {
        self.repository.get(vehicle_id).await?;

        let vehicle = Vehicle::new(data.brand_name, data.model, data.year, data.color, data.price)?;
        self.repository.update(vehicle_id, &vehicle).await
    }

    /// Obtener un vehículo por id
    pub async fn get(&self, vehicle_id: Uuid) -> Result<Vehicle, AppError> {
        self.repository.get(vehicle_id).await
    }

    /// Vehículos sin registro de venta, ordenados por precio ascendente
    pub async fn list_available(&self) -> Result<Vec<Vehicle>, AppError> {
        self.repository.list_available().await
    }

    /// Vehículos con registro de venta, ordenados por precio ascendente
    pub async fn list_sold(&self) -> Result<Vec<Vehicle>, AppError> {
        self.repository.list_sold().await
    }

    /// Inicializar la venta: available → draft
    ///
    /// Devuelve la idempotency key emitida al canal de pagos. La
    /// inicialización es single-shot por vehículo: cualquier registro
    /// existente la rechaza, sin importar su estado.
    pub async fn initialize_sale(
        &self,
        vehicle_id: Uuid,
        user_id: &str,
    ) -> Result<String, AppError> {
        let vehicle = self.repository.get_with_sale(vehicle_id).await?;
        if !vehicle.is_available() {
            return Err(AppError::AlreadySold(format!(
                "Vehicle {} already has a sale in progress",
                vehicle_id
            )));
        }

        let sale = self.repository.initialize_sale(&vehicle, user_id).await?;
        info!(
            "🚗 Venta inicializada para vehículo {} (comprador {})",
            vehicle_id, user_id
        );

        let idempotency_key = Uuid::new_v4().to_string();
        self.notify_sale_initiated(vehicle_id, &sale, &idempotency_key)
            .await;

        Ok(idempotency_key)
    }

    /// Confirmar la venta: draft → sold
    ///
    /// Refresca `sold_price` con el precio actual del vehículo y fija
    /// `sold_date`.
    pub async fn confirm_sale(&self, vehicle_id: Uuid) -> Result<(), AppError> {
        let vehicle = self.repository.get_with_sale(vehicle_id).await?;
        let sale = vehicle.sold.as_ref().ok_or_else(|| {
            AppError::SaleNotInitialized(format!(
                "Vehicle {} has no initialized sale",
                vehicle_id
            ))
        })?;

        if sale.is_sold() {
            return Err(AppError::AlreadySold(format!(
                "Vehicle {} is already sold",
                vehicle_id
            )));
        }

        self.repository.confirm_sale(&vehicle).await?;
        info!("✅ Venta confirmada para vehículo {}", vehicle_id);
        Ok(())
    }

    /// Revertir la venta: draft → available
    ///
    /// Una venta confirmada no puede revertirse por este camino.
    pub async fn revert_sale(&self, vehicle_id: Uuid) -> Result<(), AppError> {
        let vehicle = self.repository.get_with_sale(vehicle_id).await?;
        let sale = vehicle.sold.as_ref().ok_or_else(|| {
            AppError::SaleNotInitialized(format!(
                "Vehicle {} has no initialized sale",
                vehicle_id
            ))
        })?;

        if sale.is_sold() {
            return Err(AppError::AlreadySold(format!(
                "Vehicle {} sale is confirmed and cannot be reverted",
                vehicle_id
            )));
        }

        self.repository.revert_sale(&vehicle).await?;
        info!("↩️ Venta revertida para vehículo {}", vehicle_id);
        Ok(())
    }

    /// Emisión fire-and-forget del evento de venta inicializada
    ///
    /// Un fallo aquí nunca revierte la transición ya persistida: la entrega
    /// at-least-once es el mecanismo de recuperación del consumidor.
    async fn notify_sale_initiated(
        &self,
        vehicle_id: Uuid,
        sale: &SaleRecord,
        idempotency_key: &str,
    ) {
        let Some(order_id) = sale.order_id else {
            warn!(
                "⚠️ Registro de venta sin order_id, no se emite evento para {}",
                vehicle_id
            );
            return;
        };

        let event = SaleInitiatedEvent {
            vehicle_id,
            order_id,
            idempotency_key: idempotency_key.to_string(),
        };

        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("⚠️ No se pudo serializar el evento de venta: {}", e);
                return;
            }
        };

        if let Err(e) = self.queue.send(&self.queue_name, &payload).await {
            warn!(
                "⚠️ Falló la emisión del evento de venta para {}: {}",
                vehicle_id, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::models::brand::Brand;
    use crate::models::sale::SaleStatus;
    use crate::utils::errors::{conflict_error, not_found_error};

    #[derive(Default)]
    struct RepoState {
        vehicles: HashMap<Uuid, Vehicle>,
        brands: HashMap<String, Brand>,
    }

    /// Repositorio en memoria que imita las restricciones del schema:
    /// model único y como máximo un registro de venta por vehículo.
    #[derive(Clone, Default)]
    struct InMemoryRepository {
        state: Arc<Mutex<RepoState>>,
    }

    #[async_trait]
    impl VehicleRepository for InMemoryRepository {
        async fn save(&self, vehicle: &Vehicle) -> Result<Vehicle, AppError> {
            let brand = match self.get_brand(&vehicle.brand_name).await? {
                Some(brand) => brand,
                None => self.create_brand(&vehicle.brand_name).await?,
            };

            let mut state = self.state.lock().unwrap();
            if state.vehicles.values().any(|v| v.model == vehicle.model) {
                return Err(conflict_error("Vehicle", "model", &vehicle.model));
            }

            let mut stored = vehicle.clone();
            stored.id = Some(Uuid::new_v4());
            stored.brand_name = brand.name;
            stored.sold = None;
            state.vehicles.insert(stored.id.unwrap(), stored.clone());
            Ok(stored)
        }

        async fn update(&self, vehicle_id: Uuid, vehicle: &Vehicle) -> Result<Vehicle, AppError> {
            let brand = match self.get_brand(&vehicle.brand_name).await? {
                Some(brand) => brand,
                None => self.create_brand(&vehicle.brand_name).await?,
            };

            let mut state = self.state.lock().unwrap();
            if state
                .vehicles
                .iter()
                .any(|(id, v)| *id != vehicle_id && v.model == vehicle.model)
            {
                return Err(conflict_error("Vehicle", "model", &vehicle.model));
            }

            let stored = state
                .vehicles
                .get_mut(&vehicle_id)
                .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;

            stored.brand_name = brand.name;
            stored.model = vehicle.model.clone();
            stored.year = vehicle.year;
            stored.color = vehicle.color.clone();
            stored.price = vehicle.price;
            Ok(stored.clone())
        }

        async fn get(&self, vehicle_id: Uuid) -> Result<Vehicle, AppError> {
            let state = self.state.lock().unwrap();
            let mut vehicle = state
                .vehicles
                .get(&vehicle_id)
                .cloned()
                .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;
            vehicle.sold = None;
            Ok(vehicle)
        }

        async fn get_with_sale(&self, vehicle_id: Uuid) -> Result<Vehicle, AppError> {
            let state = self.state.lock().unwrap();
            state
                .vehicles
                .get(&vehicle_id)
                .cloned()
                .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))
        }

        async fn list_available(&self) -> Result<Vec<Vehicle>, AppError> {
            let state = self.state.lock().unwrap();
            let mut vehicles: Vec<Vehicle> = state
                .vehicles
                .values()
                .filter(|v| v.sold.is_none())
                .cloned()
                .collect();
            vehicles.sort_by_key(|v| v.price);
            Ok(vehicles)
        }

        async fn list_sold(&self) -> Result<Vec<Vehicle>, AppError> {
            let state = self.state.lock().unwrap();
            let mut vehicles: Vec<Vehicle> = state
                .vehicles
                .values()
                .filter(|v| v.sold.is_some())
                .cloned()
                .collect();
            vehicles.sort_by_key(|v| v.price);
            Ok(vehicles)
        }

        async fn initialize_sale(
            &self,
            vehicle: &Vehicle,
            user_id: &str,
        ) -> Result<SaleRecord, AppError> {
            let vehicle_id = vehicle.id.unwrap();
            let mut record = SaleRecord::draft(vehicle_id, vehicle.price, user_id.to_string())?;
            record.order_id = Some(Uuid::new_v4());

            let mut state = self.state.lock().unwrap();
            let stored = state
                .vehicles
                .get_mut(&vehicle_id)
                .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;

            // UNIQUE(vehicle_id) del schema
            if stored.sold.is_some() {
                return Err(AppError::AlreadySold(format!(
                    "Vehicle {} already has a sale record",
                    vehicle_id
                )));
            }

            stored.sold = Some(record.clone());
            Ok(record)
        }

        async fn confirm_sale(&self, vehicle: &Vehicle) -> Result<(), AppError> {
            let vehicle_id = vehicle.id.unwrap();
            let mut state = self.state.lock().unwrap();
            let stored = state
                .vehicles
                .get_mut(&vehicle_id)
                .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;

            match stored.sold.as_mut() {
                Some(sale) if sale.status == SaleStatus::Draft => {
                    sale.status = SaleStatus::Sold;
                    sale.sold_price = vehicle.price;
                    sale.sold_date = Some(Utc::now());
                    Ok(())
                }
                _ => Err(AppError::AlreadySold(format!(
                    "Vehicle {} has no confirmable draft sale",
                    vehicle_id
                ))),
            }
        }

        async fn revert_sale(&self, vehicle: &Vehicle) -> Result<(), AppError> {
            let vehicle_id = vehicle.id.unwrap();
            let mut state = self.state.lock().unwrap();
            let stored = state
                .vehicles
                .get_mut(&vehicle_id)
                .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;

            match stored.sold.as_ref() {
                Some(sale) if sale.status == SaleStatus::Draft => {
                    stored.sold = None;
                    Ok(())
                }
                _ => Err(AppError::AlreadySold(format!(
                    "Vehicle {} has no revertible draft sale",
                    vehicle_id
                ))),
            }
        }

        async fn get_brand(&self, name: &str) -> Result<Option<Brand>, AppError> {
            let state = self.state.lock().unwrap();
            Ok(state.brands.get(name).cloned())
        }

        async fn create_brand(&self, name: &str) -> Result<Brand, AppError> {
            let mut brand = Brand::new(name.to_string())?;
            brand.id = Some(Uuid::new_v4());

            let mut state = self.state.lock().unwrap();
            if state.brands.contains_key(name) {
                return Err(conflict_error("Brand", "name", name));
            }
            state.brands.insert(name.to_string(), brand.clone());
            Ok(brand)
        }
    }

    /// Cola que registra cada envío para poder inspeccionarlo
    #[derive(Clone, Default)]
    struct RecordingQueue {
        sends: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl SaleEventQueue for RecordingQueue {
        async fn send(&self, queue: &str, payload: &str) -> Result<(), AppError> {
            self.sends
                .lock()
                .unwrap()
                .push((queue.to_string(), payload.to_string()));
            Ok(())
        }
    }

    /// Cola caída: todo envío falla
    #[derive(Clone, Default)]
    struct FailingQueue;

    #[async_trait]
    impl SaleEventQueue for FailingQueue {
        async fn send(&self, _queue: &str, _payload: &str) -> Result<(), AppError> {
            Err(AppError::Queue("queue down".to_string()))
        }
    }

    fn service() -> (
        VehicleService<InMemoryRepository, RecordingQueue>,
        InMemoryRepository,
        RecordingQueue,
    ) {
        let repository = InMemoryRepository::default();
        let queue = RecordingQueue::default();
        let service = VehicleService::new(repository.clone(), queue.clone(), "sale-events".to_string());
        (service, repository, queue)
    }

    fn prius() -> RegisterVehicleRequest {
        RegisterVehicleRequest {
            brand_name: "Toyota".to_string(),
            model: "Prius".to_string(),
            year: 2022,
            color: "red".to_string(),
            price: Decimal::new(200_000, 0),
        }
    }

    fn corolla() -> RegisterVehicleRequest {
        RegisterVehicleRequest {
            brand_name: "Toyota".to_string(),
            model: "Corolla".to_string(),
            year: 2020,
            color: "blue".to_string(),
            price: Decimal::new(150_000, 0),
        }
    }

    #[tokio::test]
    async fn test_register_assigns_id_and_round_trips() {
        let (service, _, _) = service();

        let vehicle = service.register(prius()).await.unwrap();
        let id = vehicle.id.expect("id assigned by storage");

        let fetched = service.get(id).await.unwrap();
        assert_eq!(fetched.brand_name, "Toyota");
        assert_eq!(fetched.model, "Prius");
        assert_eq!(fetched.year, 2022);
        assert_eq!(fetched.color, "red");
        assert_eq!(fetched.price, Decimal::new(200_000, 0));
    }

    #[tokio::test]
    async fn test_register_duplicate_model_conflicts() {
        let (service, _, _) = service();

        service.register(prius()).await.unwrap();
        let result = service.register(prius()).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_invalid_input_fails_validation() {
        let (service, _, _) = service();

        let mut request = prius();
        request.year = 1700;
        let result = service.register(request).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_missing_vehicle_not_found() {
        let (service, _, _) = service();

        let result = service
            .update(
                Uuid::new_v4(),
                UpdateVehicleRequest {
                    brand_name: "Toyota".to_string(),
                    model: "Prius".to_string(),
                    year: 2022,
                    color: "red".to_string(),
                    price: Decimal::new(200_000, 0),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let (service, _, _) = service();

        let id = service.register(prius()).await.unwrap().id.unwrap();
        let updated = service
            .update(
                id,
                UpdateVehicleRequest {
                    brand_name: "Honda".to_string(),
                    model: "Civic".to_string(),
                    year: 2023,
                    color: "black".to_string(),
                    price: Decimal::new(180_000, 0),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, Some(id));
        assert_eq!(updated.brand_name, "Honda");
        assert_eq!(updated.model, "Civic");
        assert_eq!(updated.price, Decimal::new(180_000, 0));
    }

    #[tokio::test]
    async fn test_initialize_sale_creates_draft_and_returns_key() {
        let (service, repository, queue) = service();

        let id = service.register(prius()).await.unwrap().id.unwrap();
        let key = service.initialize_sale(id, "user-22").await.unwrap();
        assert!(!key.is_empty());

        let vehicle = repository.get_with_sale(id).await.unwrap();
        let sale = vehicle.sold.expect("draft sale record created");
        assert_eq!(sale.status, SaleStatus::Draft);
        assert_eq!(sale.sold_price, Decimal::new(200_000, 0));
        assert_eq!(sale.sold_date, None);
        assert_eq!(sale.user_id, "user-22");

        // Exactamente un evento, con el order_id persistido y la key devuelta
        let sends = queue.sends.lock().unwrap();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].0, "sale-events");
        let event: SaleInitiatedEvent = serde_json::from_str(&sends[0].1).unwrap();
        assert_eq!(event.vehicle_id, id);
        assert_eq!(event.order_id, sale.order_id.unwrap());
        assert_eq!(event.idempotency_key, key);
    }

    #[tokio::test]
    async fn test_initialize_sale_twice_already_sold() {
        let (service, repository, queue) = service();

        let id = service.register(prius()).await.unwrap().id.unwrap();
        service.initialize_sale(id, "user-22").await.unwrap();

        let result = service.initialize_sale(id, "user-99").await;
        assert!(matches!(result, Err(AppError::AlreadySold(_))));

        // Sigue habiendo un solo registro y un solo evento
        let vehicle = repository.get_with_sale(id).await.unwrap();
        assert_eq!(vehicle.sold.unwrap().user_id, "user-22");
        assert_eq!(queue.sends.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_sale_sets_sold_and_date() {
        let (service, repository, _) = service();

        let id = service.register(prius()).await.unwrap().id.unwrap();
        service.initialize_sale(id, "user-22").await.unwrap();
        service.confirm_sale(id).await.unwrap();

        let sale = repository.get_with_sale(id).await.unwrap().sold.unwrap();
        assert_eq!(sale.status, SaleStatus::Sold);
        assert!(sale.sold_date.is_some());

        let result = service.confirm_sale(id).await;
        assert!(matches!(result, Err(AppError::AlreadySold(_))));
    }

    #[tokio::test]
    async fn test_confirm_without_initialize_fails() {
        let (service, _, _) = service();

        let id = service.register(prius()).await.unwrap().id.unwrap();
        let result = service.confirm_sale(id).await;
        assert!(matches!(result, Err(AppError::SaleNotInitialized(_))));
    }

    #[tokio::test]
    async fn test_revert_draft_returns_vehicle_to_available() {
        let (service, _, _) = service();

        let id = service.register(prius()).await.unwrap().id.unwrap();
        service.initialize_sale(id, "user-22").await.unwrap();
        service.revert_sale(id).await.unwrap();

        let available = service.list_available().await.unwrap();
        assert!(available.iter().any(|v| v.id == Some(id)));
        assert!(service.list_sold().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_revert_sold_fails_and_keeps_record() {
        let (service, repository, _) = service();

        let id = service.register(prius()).await.unwrap().id.unwrap();
        service.initialize_sale(id, "user-22").await.unwrap();
        service.confirm_sale(id).await.unwrap();

        let result = service.revert_sale(id).await;
        assert!(matches!(result, Err(AppError::AlreadySold(_))));

        let sale = repository.get_with_sale(id).await.unwrap().sold.unwrap();
        assert_eq!(sale.status, SaleStatus::Sold);
    }

    #[tokio::test]
    async fn test_revert_without_initialize_fails() {
        let (service, _, _) = service();

        let id = service.register(prius()).await.unwrap().id.unwrap();
        let result = service.revert_sale(id).await;
        assert!(matches!(result, Err(AppError::SaleNotInitialized(_))));
    }

    #[tokio::test]
    async fn test_listings_partition_by_sale_record() {
        let (service, _, _) = service();

        let prius_id = service.register(prius()).await.unwrap().id.unwrap();
        let corolla_id = service.register(corolla()).await.unwrap().id.unwrap();
        service.initialize_sale(prius_id, "user-22").await.unwrap();

        let available = service.list_available().await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, Some(corolla_id));
        assert!(available.iter().all(|v| v.sold.is_none()));

        let sold = service.list_sold().await.unwrap();
        assert_eq!(sold.len(), 1);
        assert_eq!(sold[0].id, Some(prius_id));
        assert!(sold.iter().all(|v| v.sold.is_some()));
    }

    #[tokio::test]
    async fn test_listings_ordered_by_price_ascending() {
        let (service, _, _) = service();

        service.register(prius()).await.unwrap();
        service.register(corolla()).await.unwrap();

        let available = service.list_available().await.unwrap();
        assert_eq!(available[0].model, "Corolla");
        assert_eq!(available[1].model, "Prius");
    }

    #[tokio::test]
    async fn test_initialize_sale_survives_queue_failure() {
        let repository = InMemoryRepository::default();
        let service = VehicleService::new(
            repository.clone(),
            FailingQueue::default(),
            "sale-events".to_string(),
        );

        let id = service.register(prius()).await.unwrap().id.unwrap();
        let key = service.initialize_sale(id, "user-22").await.unwrap();
        assert!(!key.is_empty());

        // La transición persistida queda en pie aunque la emisión falle
        let vehicle = repository.get_with_sale(id).await.unwrap();
        assert!(vehicle.sold.is_some());
    }

    #[tokio::test]
    async fn test_brand_created_once_per_name() {
        let (service, repository, _) = service();

        service.register(prius()).await.unwrap();
        service.register(corolla()).await.unwrap();

        let brand = repository.get_brand("Toyota").await.unwrap().unwrap();
        assert_eq!(brand.name, "Toyota");
        assert!(repository.get_brand("Honda").await.unwrap().is_none());

        // La marca ya existe: un segundo alta explícito es un conflicto
        let result = repository.create_brand("Toyota").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (service, _, _) = service();

        let id = service.register(prius()).await.unwrap().id.unwrap();
        let key = service.initialize_sale(id, "user-22").await.unwrap();
        assert!(!key.is_empty());

        service.confirm_sale(id).await.unwrap();

        // sold es terminal: no hay transición de salida
        let result = service.revert_sale(id).await;
        assert!(matches!(result, Err(AppError::AlreadySold(_))));

        let sold = service.list_sold().await.unwrap();
        assert_eq!(sold.len(), 1);
        assert_eq!(sold[0].id, Some(id));
    }
}
