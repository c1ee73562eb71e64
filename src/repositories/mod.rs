//! Repositorios
//!
//! Puertos de persistencia y sus adaptadores PostgreSQL.

pub mod vehicle_repository;
