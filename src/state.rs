//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::queue::RedisQueueClient;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub queue: RedisQueueClient,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig, queue: RedisQueueClient) -> Self {
        Self {
            pool,
            config,
            queue,
        }
    }
}
