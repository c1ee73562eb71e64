//! Modelo de SaleRecord
//!
//! Este módulo contiene el registro de venta de un vehículo y su estado.
//! Un vehículo tiene como máximo un registro de venta; el registro existe
//! exactamente mientras haya una venta inicializada para ese vehículo.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;
use validator::Validate;

use crate::utils::errors::AppError;
use crate::utils::validation::validate_positive_price;

/// Estado de la venta - mapea al ENUM sale_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "sale_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Draft,
    Sold,
}

/// Registro de venta - el order_id lo asigna el storage
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct SaleRecord {
    pub order_id: Option<Uuid>,

    pub vehicle_id: Uuid,

    pub status: SaleStatus,

    #[validate(custom = "validate_positive_price")]
    pub sold_price: Decimal,

    pub sold_date: Option<DateTime<Utc>>,

    #[validate(length(min = 1))]
    pub user_id: String,
}

impl SaleRecord {
    /// Registro en estado draft recién inicializado
    ///
    /// `sold_price` se toma del precio actual del vehículo; `sold_date`
    /// queda vacío hasta la confirmación.
    pub fn draft(vehicle_id: Uuid, sold_price: Decimal, user_id: String) -> Result<Self, AppError> {
        let record = Self {
            order_id: None,
            vehicle_id,
            status: SaleStatus::Draft,
            sold_price,
            sold_date: None,
            user_id,
        };
        record.validate()?;
        Ok(record)
    }

    pub fn is_sold(&self) -> bool {
        self.status == SaleStatus::Sold
    }
}
