//! Controllers
//!
//! Capa fina entre las rutas y el servicio: arma el servicio con el
//! repositorio y la cola del estado compartido, y mapea entidades a DTOs.

pub mod sale_controller;
pub mod vehicle_controller;
