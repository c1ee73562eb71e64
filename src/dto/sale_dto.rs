//! DTOs de Sale
//!
//! Requests y responses de las operaciones de venta.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::sale::{SaleRecord, SaleStatus};

// Request para inicializar una venta; el comprador viene del gateway
#[derive(Debug, Deserialize)]
pub struct InitializeSaleRequest {
    pub user_id: String,
}

// Response de inicialización con la clave para el canal de pagos
#[derive(Debug, Serialize)]
pub struct InitializeSaleResponse {
    pub idempotency_key: String,
}

// Response del registro de venta embebido en un vehículo
#[derive(Debug, Serialize)]
pub struct SaleResponse {
    pub order_id: Option<Uuid>,
    pub vehicle_id: Uuid,
    pub status: SaleStatus,
    pub sold_price: Decimal,
    pub sold_date: Option<DateTime<Utc>>,
    pub user_id: String,
}

impl From<SaleRecord> for SaleResponse {
    fn from(record: SaleRecord) -> Self {
        Self {
            order_id: record.order_id,
            vehicle_id: record.vehicle_id,
            status: record.status,
            sold_price: record.sold_price,
            sold_date: record.sold_date,
            user_id: record.user_id,
        }
    }
}
