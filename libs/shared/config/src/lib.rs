use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub starvation_sweep_interval_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            starvation_sweep_interval_secs: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Unparseable values
    /// fall back to their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = match lookup("HOST") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("HOST '{}' is not a valid IP address, using {}", raw, defaults.host);
                defaults.host
            }),
            None => {
                warn!("HOST not set, using default {}", defaults.host);
                defaults.host
            }
        };

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("PORT '{}' is not a valid port, using {}", raw, defaults.port);
                defaults.port
            }),
            None => {
                warn!("PORT not set, using default {}", defaults.port);
                defaults.port
            }
        };

        let starvation_sweep_interval_secs = match lookup("STARVATION_SWEEP_INTERVAL_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(secs),
                Err(_) => {
                    warn!("STARVATION_SWEEP_INTERVAL_SECS '{}' is not a number, sweeper disabled", raw);
                    None
                }
            },
            None => None,
        };

        Self {
            host,
            port,
            starvation_sweep_interval_secs,
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        self.starvation_sweep_interval_secs.map(Duration::from_secs)
    }
}
