//! Modelo de Vehicle
//!
//! Este módulo contiene la entidad Vehicle del dominio.
//! El id lo asigna el storage al persistir; antes de eso es None.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::sale::SaleRecord;
use crate::utils::errors::AppError;
use crate::utils::validation::validate_positive_price;

/// Vehículo del dominio con su registro de venta embebido (si existe)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct Vehicle {
    pub id: Option<Uuid>,

    #[validate(length(min = 1, max = 100))]
    pub brand_name: String,

    #[validate(length(min = 1, max = 100))]
    pub model: String,

    #[validate(range(min = 1886))]
    pub year: i32,

    #[validate(length(min = 1, max = 50))]
    pub color: String,

    #[validate(custom = "validate_positive_price")]
    pub price: Decimal,

    pub sold: Option<SaleRecord>,
}

impl Vehicle {
    /// Construir un vehículo validado
    ///
    /// Falla con `AppError::Validation` si algún campo viola sus límites.
    pub fn new(
        brand_name: String,
        model: String,
        year: i32,
        color: String,
        price: Decimal,
    ) -> Result<Self, AppError> {
        let vehicle = Self {
            id: None,
            brand_name,
            model,
            year,
            color,
            price,
            sold: None,
        };
        vehicle.validate()?;
        Ok(vehicle)
    }

    /// Un vehículo está disponible mientras no tenga registro de venta
    pub fn is_available(&self) -> bool {
        self.sold.is_none()
    }
}
