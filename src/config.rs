use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{invalid_input_error, Error};
use crate::monitor::DEFAULT_POLL_INTERVAL;

const DEFAULT_API_BASE: &str = "maps.googleapis.com";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Clone, Debug)]
pub struct Config {
    pub google_maps_api_base: String,
    pub google_maps_api_key: String,
    pub bind_addr: SocketAddr,
    pub poll_interval: Duration,
}

impl Config {
    /// Reads configuration from the environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        let google_maps_api_base =
            env::var("GOOGLE_MAPS_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into());
        let google_maps_api_key = env::var("GOOGLE_MAPS_API_KEY")?;

        let bind_addr: SocketAddr = env::var("DETOUR_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.into())
            .parse()
            .map_err(|_| invalid_input_error("DETOUR_BIND_ADDR is not a socket address"))?;

        let poll_interval = match env::var("DETOUR_POLL_INTERVAL_MS") {
            Ok(value) => Duration::from_millis(value.parse().map_err(|_| {
                invalid_input_error("DETOUR_POLL_INTERVAL_MS is not a number")
            })?),
            Err(_) => DEFAULT_POLL_INTERVAL,
        };

        Ok(Self {
            google_maps_api_base,
            google_maps_api_key,
            bind_addr,
            poll_interval,
        })
    }
}
