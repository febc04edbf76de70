pub mod store_routes;
pub mod system_routes;
