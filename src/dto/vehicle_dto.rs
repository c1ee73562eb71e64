//! DTOs de Vehicle
//!
//! Requests y responses del recurso vehículo, más la envoltura
//! genérica `ApiResponse` que usan las rutas de escritura.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::sale_dto::SaleResponse;
use crate::models::vehicle::Vehicle;

// Request para registrar un vehículo
#[derive(Debug, Deserialize)]
pub struct RegisterVehicleRequest {
    pub brand_name: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub price: Decimal,
}

// Request para actualizar un vehículo (reemplazo completo de campos)
#[derive(Debug, Deserialize)]
pub struct UpdateVehicleRequest {
    pub brand_name: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub price: Decimal,
}

// Response de vehículo
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: Option<Uuid>,
    pub brand_name: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub price: Decimal,
    pub sold: Option<SaleResponse>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            brand_name: vehicle.brand_name,
            model: vehicle.model,
            year: vehicle.year,
            color: vehicle.color,
            price: vehicle.price,
            sold: vehicle.sold.map(SaleResponse::from),
        }
    }
}

// Response genérica
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            data: Some(data),
        }
    }
}
