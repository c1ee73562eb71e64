//! Cola de eventos
//!
//! Canal de notificación fire-and-forget hacia el canal de pagos.

pub mod redis_queue;

pub use redis_queue::{RedisQueueClient, SaleEventQueue, SaleInitiatedEvent};
