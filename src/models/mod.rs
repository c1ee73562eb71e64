//! Modelos del sistema
//!
//! Este módulo contiene las entidades del dominio validadas en
//! construcción: Vehicle, Brand y SaleRecord.

pub mod brand;
pub mod sale;
pub mod vehicle;
