use tokio::time::Duration;

use std::path::PathBuf;

pub const PRODUCTION_HOST: &str = "api.push.apple.com";
pub const SANDBOX_HOST: &str = "api.development.push.apple.com";
pub const DEFAULT_PORT: u16 = 443;
pub const ALTERNATIVE_PORT: u16 = 2197;

/// Gateway environment to deliver to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

/// Settings for a TLS-backed client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: Environment,
    /// Use port 2197 instead of 443
    pub use_alternative_port: bool,
    /// PEM file with the client certificate chain, and the private key unless `key_file` is set
    pub cert_file: PathBuf,
    pub key_file: Option<PathBuf>,
    /// Time allowed for the gateway's initial SETTINGS to arrive after connecting
    pub settle_timeout: Duration,
}

impl ClientConfig {
    pub fn new(cert_file: impl Into<PathBuf>) -> Self {
        Self {
            environment: Environment::Production,
            use_alternative_port: false,
            cert_file: cert_file.into(),
            key_file: None,
            settle_timeout: Duration::from_secs(5),
        }
    }

    pub fn host(&self) -> &'static str {
        match self.environment {
            Environment::Production => PRODUCTION_HOST,
            Environment::Sandbox => SANDBOX_HOST,
        }
    }

    pub fn port(&self) -> u16 {
        if self.use_alternative_port {
            ALTERNATIVE_PORT
        } else {
            DEFAULT_PORT
        }
    }

    /// `host:port` to dial, also used as the request authority
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host(), self.port())
    }
}
