pub mod sale_routes;
pub mod vehicle_routes;
