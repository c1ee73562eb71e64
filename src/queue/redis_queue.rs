//! Cliente Redis de la cola de eventos
//!
//! Canal de salida hacia el consumidor de iniciación de pagos. El envío es
//! one-way: no se espera respuesta y el que llama decide qué hacer si falla.

use anyhow::Result;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::utils::errors::AppError;

/// Evento de venta inicializada
///
/// La idempotency key es de un solo uso: el consumidor la utiliza para no
/// procesar dos veces un evento reintentado.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleInitiatedEvent {
    pub vehicle_id: Uuid,
    pub order_id: Uuid,
    pub idempotency_key: String,
}

/// Puerto de salida de eventos de venta
#[async_trait]
pub trait SaleEventQueue: Send + Sync {
    async fn send(&self, queue: &str, payload: &str) -> Result<(), AppError>;
}

/// Cliente Redis con connection manager
#[derive(Clone)]
pub struct RedisQueueClient {
    manager: ConnectionManager,
}

impl RedisQueueClient {
    /// Crear nuevo cliente conectado a Redis
    pub async fn new(redis_url: &str) -> Result<Self> {
        info!("🔗 Conectando a Redis: {}", redis_url);

        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;

        // Test de conexión usando un comando simple
        let mut conn = manager.clone();
        let _: () = redis::cmd("PING").query_async(&mut conn).await?;

        info!("✅ Redis conectado exitosamente");

        Ok(Self { manager })
    }
}

#[async_trait]
impl SaleEventQueue for RedisQueueClient {
    async fn send(&self, queue: &str, payload: &str) -> Result<(), AppError> {
        let mut conn = self.manager.clone();

        let _: i64 = conn
            .lpush(queue, payload)
            .await
            .map_err(|e| AppError::Queue(format!("Error enviando evento a '{}': {}", queue, e)))?;

        debug!("📤 Evento encolado en '{}'", queue);
        Ok(())
    }
}
