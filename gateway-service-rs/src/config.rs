//! Service configuration from environment variables
//!
//! `GATEWAY_SERVICE_ADDR` overrides the full bind address; otherwise the
//! service binds `0.0.0.0` on `GATEWAY_SERVICE_PORT` (default 8000). Bad
//! values warn and fall back rather than failing startup.

use std::env;
use std::net::SocketAddr;

const DEFAULT_PORT: u16 = 8000;

/// Get the service port from the environment with fallback
pub fn service_port() -> u16 {
    env::var("GATEWAY_SERVICE_PORT")
        .unwrap_or_else(|_| DEFAULT_PORT.to_string())
        .parse::<u16>()
        .unwrap_or_else(|_| {
            log::warn!(
                "Invalid port in GATEWAY_SERVICE_PORT, using default {}",
                DEFAULT_PORT
            );
            DEFAULT_PORT
        })
}

/// Resolve the address the service binds
pub fn bind_address() -> SocketAddr {
    if let Ok(addr_str) = env::var("GATEWAY_SERVICE_ADDR") {
        if let Ok(addr) = addr_str.parse::<SocketAddr>() {
            return addr;
        }
        log::warn!("Invalid address format in GATEWAY_SERVICE_ADDR, using default");
    }
    SocketAddr::from(([0, 0, 0, 0], service_port()))
}

/// Identifier stamped on every request log line
pub fn instance_id() -> String {
    env::var("INSTANCE_ID").unwrap_or_else(|_| uuid::Uuid::new_v4().simple().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bind_address_uses_the_default_port() {
        env::remove_var("GATEWAY_SERVICE_ADDR");
        env::remove_var("GATEWAY_SERVICE_PORT");
        assert_eq!(bind_address(), SocketAddr::from(([0, 0, 0, 0], 8000)));
    }

    #[test]
    fn instance_id_is_generated_when_unset() {
        env::remove_var("INSTANCE_ID");
        assert!(!instance_id().is_empty());
    }
}
