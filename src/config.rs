use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

const BIND_VAR: &str = "CONTRACTOR_VISION_BIND";
const FETCH_TIMEOUT_VAR: &str = "CONTRACTOR_VISION_FETCH_TIMEOUT_SECS";
const CONNECT_TIMEOUT_VAR: &str = "CONTRACTOR_VISION_CONNECT_TIMEOUT_SECS";
const INSECURE_SSL_VAR: &str = "CONTRACTOR_VISION_INSECURE_SSL";
const USER_AGENT_VAR: &str = "CONTRACTOR_VISION_USER_AGENT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub fetch_timeout: Duration,
    pub connect_timeout: Duration,
    pub insecure_ssl: bool,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            fetch_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            insecure_ssl: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match var(BIND_VAR) {
            Some(v) => parse_value(BIND_VAR, &v)?,
            None => defaults.bind_addr,
        };
        let fetch_timeout = match var(FETCH_TIMEOUT_VAR) {
            Some(v) => Duration::from_secs(parse_value(FETCH_TIMEOUT_VAR, &v)?),
            None => defaults.fetch_timeout,
        };
        let connect_timeout = match var(CONNECT_TIMEOUT_VAR) {
            Some(v) => Duration::from_secs(parse_value(CONNECT_TIMEOUT_VAR, &v)?),
            None => defaults.connect_timeout,
        };

        Ok(Self {
            bind_addr,
            fetch_timeout,
            connect_timeout,
            insecure_ssl: var(INSECURE_SSL_VAR).as_deref() == Some("1"),
            user_agent: var(USER_AGENT_VAR).unwrap_or(defaults.user_agent),
        })
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
