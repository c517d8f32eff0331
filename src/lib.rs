pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod entities;
pub mod error;
pub mod external;
pub mod fetcher;
pub mod monitor;
pub mod notify;
pub mod server;
