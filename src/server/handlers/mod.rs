pub mod monitor;
pub mod places;
pub mod routes;
pub mod traffic;
