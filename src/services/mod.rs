//! Services module
//!
//! Este módulo contiene la lógica de negocio de la aplicación. El servicio
//! de vehículos encapsula la máquina de estados de la venta sobre los
//! puertos de persistencia y de eventos.

pub mod vehicle_service;
