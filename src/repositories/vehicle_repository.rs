//! Repositorio de vehículos
//!
//! Este módulo define el puerto de persistencia y su adaptador PostgreSQL.
//! La unicidad de `vehicle.model` y de `vehicle_sold.vehicle_id` en el
//! schema es el respaldo de consistencia ante accesos concurrentes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::brand::Brand;
use crate::models::sale::{SaleRecord, SaleStatus};
use crate::models::vehicle::Vehicle;
use crate::utils::errors::{conflict_error, not_found_error, AppError};

/// Puerto de persistencia de vehículos
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn save(&self, vehicle: &Vehicle) -> Result<Vehicle, AppError>;
    async fn update(&self, vehicle_id: Uuid, vehicle: &Vehicle) -> Result<Vehicle, AppError>;
    async fn get(&self, vehicle_id: Uuid) -> Result<Vehicle, AppError>;
    async fn get_with_sale(&self, vehicle_id: Uuid) -> Result<Vehicle, AppError>;
    async fn list_available(&self) -> Result<Vec<Vehicle>, AppError>;
    async fn list_sold(&self) -> Result<Vec<Vehicle>, AppError>;
    async fn initialize_sale(&self, vehicle: &Vehicle, user_id: &str)
        -> Result<SaleRecord, AppError>;
    async fn confirm_sale(&self, vehicle: &Vehicle) -> Result<(), AppError>;
    async fn revert_sale(&self, vehicle: &Vehicle) -> Result<(), AppError>;
    async fn get_brand(&self, name: &str) -> Result<Option<Brand>, AppError>;
    async fn create_brand(&self, name: &str) -> Result<Brand, AppError>;
}

// Filas sqlx internas del adaptador

#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    model: String,
    year: i32,
    color: String,
    price: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct VehicleWithBrandRow {
    id: Uuid,
    brand_name: String,
    model: String,
    year: i32,
    color: String,
    price: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct VehicleWithSaleRow {
    id: Uuid,
    brand_name: String,
    model: String,
    year: i32,
    color: String,
    price: Decimal,
    order_id: Option<Uuid>,
    status: Option<SaleStatus>,
    sold_price: Option<Decimal>,
    sold_date: Option<DateTime<Utc>>,
    user_id: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    order_id: Uuid,
    vehicle_id: Uuid,
    status: SaleStatus,
    sold_price: Decimal,
    sold_date: Option<DateTime<Utc>>,
    user_id: String,
}

#[derive(Debug, sqlx::FromRow)]
struct BrandRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VehicleWithBrandRow {
    fn into_entity(self) -> Vehicle {
        Vehicle {
            id: Some(self.id),
            brand_name: self.brand_name,
            model: self.model,
            year: self.year,
            color: self.color,
            price: self.price,
            sold: None,
        }
    }
}

impl VehicleWithSaleRow {
    fn into_entity(self) -> Vehicle {
        let sold = match (self.order_id, self.status, self.sold_price, self.user_id) {
            (Some(order_id), Some(status), Some(sold_price), Some(user_id)) => Some(SaleRecord {
                order_id: Some(order_id),
                vehicle_id: self.id,
                status,
                sold_price,
                sold_date: self.sold_date,
                user_id,
            }),
            _ => None,
        };

        Vehicle {
            id: Some(self.id),
            brand_name: self.brand_name,
            model: self.model,
            year: self.year,
            color: self.color,
            price: self.price,
            sold,
        }
    }
}

impl SaleRow {
    fn into_record(self) -> SaleRecord {
        SaleRecord {
            order_id: Some(self.order_id),
            vehicle_id: self.vehicle_id,
            status: self.status,
            sold_price: self.sold_price,
            sold_date: self.sold_date,
            user_id: self.user_id,
        }
    }
}

impl BrandRow {
    fn into_entity(self) -> Brand {
        Brand {
            id: Some(self.id),
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Adaptador PostgreSQL del puerto
pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn is_unique_violation(error: &sqlx::Error) -> bool {
        matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
    }

    fn require_id(vehicle: &Vehicle) -> Result<Uuid, AppError> {
        vehicle
            .id
            .ok_or_else(|| AppError::Internal("vehicle entity has no assigned id".to_string()))
    }

    /// Buscar o crear la marca dentro de la transacción del vehículo.
    /// El INSERT es idempotente: una carrera entre dos primeros usos de la
    /// misma marca resuelve en una sola fila.
    async fn resolve_brand(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
    ) -> Result<BrandRow, AppError> {
        sqlx::query(
            r#"
            INSERT INTO vehicle_brand (id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        let brand = sqlx::query_as::<_, BrandRow>(
            "SELECT id, name, created_at, updated_at FROM vehicle_brand WHERE name = $1",
        )
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;

        Ok(brand)
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn save(&self, vehicle: &Vehicle) -> Result<Vehicle, AppError> {
        let mut tx = self.pool.begin().await?;
        let brand = Self::resolve_brand(&mut tx, &vehicle.brand_name).await?;

        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            INSERT INTO vehicle (id, brand_id, model, year, color, price, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING id, model, year, color, price
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(brand.id)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.color)
        .bind(vehicle.price)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if Self::is_unique_violation(&e) {
                conflict_error("Vehicle", "model", &vehicle.model)
            } else {
                AppError::Database(e)
            }
        })?;

        tx.commit().await?;

        Ok(Vehicle {
            id: Some(row.id),
            brand_name: brand.name,
            model: row.model,
            year: row.year,
            color: row.color,
            price: row.price,
            sold: None,
        })
    }

    async fn update(&self, vehicle_id: Uuid, vehicle: &Vehicle) -> Result<Vehicle, AppError> {
        let mut tx = self.pool.begin().await?;
        let brand = Self::resolve_brand(&mut tx, &vehicle.brand_name).await?;

        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            UPDATE vehicle
            SET brand_id = $2, model = $3, year = $4, color = $5, price = $6, updated_at = $7
            WHERE id = $1
            RETURNING id, model, year, color, price
            "#,
        )
        .bind(vehicle_id)
        .bind(brand.id)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.color)
        .bind(vehicle.price)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            if Self::is_unique_violation(&e) {
                conflict_error("Vehicle", "model", &vehicle.model)
            } else {
                AppError::Database(e)
            }
        })?
        .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;

        tx.commit().await?;

        Ok(Vehicle {
            id: Some(row.id),
            brand_name: brand.name,
            model: row.model,
            year: row.year,
            color: row.color,
            price: row.price,
            sold: None,
        })
    }

    async fn get(&self, vehicle_id: Uuid) -> Result<Vehicle, AppError> {
        let row = sqlx::query_as::<_, VehicleWithBrandRow>(
            r#"
            SELECT v.id, b.name AS brand_name, v.model, v.year, v.color, v.price
            FROM vehicle v
            JOIN vehicle_brand b ON b.id = v.brand_id
            WHERE v.id = $1
            "#,
        )
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;

        Ok(row.into_entity())
    }

    async fn get_with_sale(&self, vehicle_id: Uuid) -> Result<Vehicle, AppError> {
        let row = sqlx::query_as::<_, VehicleWithSaleRow>(
            r#"
            SELECT v.id, b.name AS brand_name, v.model, v.year, v.color, v.price,
                   s.order_id, s.status, s.sold_price, s.sold_date, s.user_id
            FROM vehicle v
            JOIN vehicle_brand b ON b.id = v.brand_id
            LEFT JOIN vehicle_sold s ON s.vehicle_id = v.id
            WHERE v.id = $1
            "#,
        )
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found_error("Vehicle", &vehicle_id.to_string()))?;

        Ok(row.into_entity())
    }

    async fn list_available(&self) -> Result<Vec<Vehicle>, AppError> {
        let rows = sqlx::query_as::<_, VehicleWithBrandRow>(
            r#"
            SELECT v.id, b.name AS brand_name, v.model, v.year, v.color, v.price
            FROM vehicle v
            JOIN vehicle_brand b ON b.id = v.brand_id
            LEFT JOIN vehicle_sold s ON s.vehicle_id = v.id
            WHERE s.order_id IS NULL
            ORDER BY v.price ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(VehicleWithBrandRow::into_entity).collect())
    }

    async fn list_sold(&self) -> Result<Vec<Vehicle>, AppError> {
        let rows = sqlx::query_as::<_, VehicleWithSaleRow>(
            r#"
            SELECT v.id, b.name AS brand_name, v.model, v.year, v.color, v.price,
                   s.order_id, s.status, s.sold_price, s.sold_date, s.user_id
            FROM vehicle v
            JOIN vehicle_brand b ON b.id = v.brand_id
            JOIN vehicle_sold s ON s.vehicle_id = v.id
            ORDER BY v.price ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(VehicleWithSaleRow::into_entity).collect())
    }

    async fn initialize_sale(
        &self,
        vehicle: &Vehicle,
        user_id: &str,
    ) -> Result<SaleRecord, AppError> {
        let vehicle_id = Self::require_id(vehicle)?;
        let record = SaleRecord::draft(vehicle_id, vehicle.price, user_id.to_string())?;

        let row = sqlx::query_as::<_, SaleRow>(
            r#"
            INSERT INTO vehicle_sold (order_id, vehicle_id, status, sold_price, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING order_id, vehicle_id, status, sold_price, sold_date, user_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.vehicle_id)
        .bind(record.status)
        .bind(record.sold_price)
        .bind(&record.user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if Self::is_unique_violation(&e) {
                AppError::AlreadySold(format!(
                    "Vehicle {} already has a sale record",
                    vehicle_id
                ))
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(row.into_record())
    }

    async fn confirm_sale(&self, vehicle: &Vehicle) -> Result<(), AppError> {
        let vehicle_id = Self::require_id(vehicle)?;

        // El filtro por status serializa contra confirmaciones concurrentes
        let result = sqlx::query(
            r#"
            UPDATE vehicle_sold
            SET status = $2, sold_price = $3, sold_date = $4, updated_at = $4
            WHERE vehicle_id = $1 AND status = $5
            "#,
        )
        .bind(vehicle_id)
        .bind(SaleStatus::Sold)
        .bind(vehicle.price)
        .bind(Utc::now())
        .bind(SaleStatus::Draft)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::AlreadySold(format!(
                "Vehicle {} has no confirmable draft sale",
                vehicle_id
            )));
        }

        Ok(())
    }

    async fn revert_sale(&self, vehicle: &Vehicle) -> Result<(), AppError> {
        let vehicle_id = Self::require_id(vehicle)?;

        let result = sqlx::query("DELETE FROM vehicle_sold WHERE vehicle_id = $1 AND status = $2")
            .bind(vehicle_id)
            .bind(SaleStatus::Draft)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::AlreadySold(format!(
                "Vehicle {} has no revertible draft sale",
                vehicle_id
            )));
        }

        Ok(())
    }

    async fn get_brand(&self, name: &str) -> Result<Option<Brand>, AppError> {
        let row = sqlx::query_as::<_, BrandRow>(
            "SELECT id, name, created_at, updated_at FROM vehicle_brand WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BrandRow::into_entity))
    }

    async fn create_brand(&self, name: &str) -> Result<Brand, AppError> {
        let brand = Brand::new(name.to_string())?;

        let row = sqlx::query_as::<_, BrandRow>(
            r#"
            INSERT INTO vehicle_brand (id, name, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&brand.name)
        .bind(brand.created_at)
        .bind(brand.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if Self::is_unique_violation(&e) {
                conflict_error("Brand", "name", name)
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(row.into_entity())
    }
}
