//! Server settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `SWAP_*` environment variables, or a config
//! file. Without `database_url` the server runs on the in-memory store.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;
use swap_backend::outbound::push::DEFAULT_EXPO_ENDPOINT;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 5;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Errors raised when a configured value cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value}: {message}")]
    BindAddr { value: String, message: String },
    #[error("invalid push endpoint {value}: {message}")]
    PushEndpoint { value: String, message: String },
}

/// Runtime settings for the swap server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SWAP")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; absent selects the in-memory store.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub database_max_connections: Option<u32>,
    /// Deliver pushes through Expo instead of dropping them.
    #[ortho_config(default = false)]
    pub push_enabled: bool,
    /// Override for the Expo push endpoint.
    pub push_endpoint: Option<String>,
    /// Per-push HTTP timeout in seconds.
    pub push_timeout_secs: Option<u64>,
}

impl ServerSettings {
    /// Parsed bind address, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: value.to_owned(),
            message: err.to_string(),
        })
    }

    /// Parsed push endpoint, defaulting to the public Expo service.
    pub fn push_endpoint(&self) -> Result<Url, SettingsError> {
        let value = self.push_endpoint.as_deref().unwrap_or(DEFAULT_EXPO_ENDPOINT);
        Url::parse(value).map_err(|err| SettingsError::PushEndpoint {
            value: value.to_owned(),
            message: err.to_string(),
        })
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_secs(
            self.push_timeout_secs
                .unwrap_or(DEFAULT_PUSH_TIMEOUT_SECS)
                .max(1),
        )
    }

    pub fn database_max_connections(&self) -> u32 {
        self.database_max_connections
            .unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for server settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 6] = [
        "SWAP_BIND_ADDR",
        "SWAP_DATABASE_URL",
        "SWAP_DATABASE_MAX_CONNECTIONS",
        "SWAP_PUSH_ENABLED",
        "SWAP_PUSH_ENDPOINT",
        "SWAP_PUSH_TIMEOUT_SECS",
    ];

    fn load_from_empty_args() -> ServerSettings {
        ServerSettings::load_from_iter([OsString::from("swap-backend")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_select_memory_store_without_push() {
        let _guard = lock_env(KEYS.map(|key| (key, None::<String>)));

        let settings = load_from_empty_args();
        assert!(settings.database_url.is_none());
        assert!(!settings.push_enabled);
        assert_eq!(
            settings.bind_addr().expect("default parses"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("literal")
        );
        assert_eq!(settings.push_timeout(), Duration::from_secs(5));
        assert_eq!(settings.database_max_connections(), 10);
        assert_eq!(
            settings.push_endpoint().expect("default parses").as_str(),
            DEFAULT_EXPO_ENDPOINT
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("SWAP_BIND_ADDR", Some("127.0.0.1:9090".to_owned())),
            (
                "SWAP_DATABASE_URL",
                Some("postgres://localhost/swap".to_owned()),
            ),
            ("SWAP_DATABASE_MAX_CONNECTIONS", Some("4".to_owned())),
            ("SWAP_PUSH_ENABLED", Some("true".to_owned())),
            (
                "SWAP_PUSH_ENDPOINT",
                Some("http://localhost:4000/push".to_owned()),
            ),
            ("SWAP_PUSH_TIMEOUT_SECS", Some("0".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("override parses").port(),
            9090
        );
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://localhost/swap")
        );
        assert_eq!(settings.database_max_connections(), 4);
        assert!(settings.push_enabled);
        assert_eq!(
            settings.push_endpoint().expect("override parses").path(),
            "/push"
        );
        assert_eq!(settings.push_timeout(), Duration::from_secs(1));
    }

    #[rstest]
    fn malformed_bind_address_is_reported() {
        let _guard = lock_env([("SWAP_BIND_ADDR", Some("localhost".to_owned()))]);

        let err = load_from_empty_args()
            .bind_addr()
            .expect_err("missing port");
        assert!(matches!(err, SettingsError::BindAddr { .. }));
    }
}
