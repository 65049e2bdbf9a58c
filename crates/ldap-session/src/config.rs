//! Connection configuration for directory sessions.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;
use validator::Validate;

/// URL schemes understood by the protocol layer.
pub const SUPPORTED_SCHEMES: &[&str] = &["ldap", "ldaps", "ldapi"];

/// Configuration for connecting to a directory server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct DirectoryConfig {
    /// Server URL, e.g. `ldaps://ldap.example.com:636`.
    #[validate(url)]
    url: String,

    /// Upgrade a plain `ldap://` connection with StartTLS.
    #[serde(default)]
    starttls: bool,

    /// Whether to verify TLS certificates.
    #[serde(default = "default_tls_verify")]
    tls_verify: bool,

    /// Optional path to a PEM-encoded CA certificate.
    #[serde(default)]
    tls_ca_cert: Option<PathBuf>,
}

const fn default_tls_verify() -> bool {
    true
}

impl DirectoryConfig {
    /// Creates a configuration for the given server URL.
    ///
    /// The URL is copied; the configuration keeps no link to the caller's buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the URL is empty, does not parse, or uses a scheme other
    /// than `ldap`, `ldaps` or `ldapi`.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let config = Self {
            url: url.into(),
            starttls: false,
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
        };
        config.check()?;
        Ok(config)
    }

    /// Validates a configuration obtained through deserialization.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] under the same conditions as [`DirectoryConfig::new`].
    pub fn check(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::Validation("URL cannot be empty".to_string()));
        }
        self.validate()?;

        let parsed = Url::parse(&self.url)?;
        if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
            return Err(Error::Validation(format!(
                "Unsupported URL scheme {}",
                parsed.scheme()
            )));
        }
        Ok(())
    }

    /// Returns the server URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns whether StartTLS is requested.
    #[must_use]
    pub const fn starttls(&self) -> bool {
        self.starttls
    }

    /// Returns whether TLS certificate verification is enabled.
    #[must_use]
    pub const fn tls_verify(&self) -> bool {
        self.tls_verify
    }

    /// Optional custom CA certificate path.
    #[must_use]
    pub fn tls_ca_cert(&self) -> Option<&PathBuf> {
        self.tls_ca_cert.as_ref()
    }

    /// Enables or disables StartTLS.
    #[must_use]
    pub const fn with_starttls(mut self, starttls: bool) -> Self {
        self.starttls = starttls;
        self
    }

    /// Enables or disables TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verification(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Sets the custom CA certificate path for TLS verification.
    #[must_use]
    pub fn with_tls_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }
}
