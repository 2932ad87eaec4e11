//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named database server connection profile
///
/// Serialized with the on-disk field names of the profile file:
/// `{ "name", "hostname", "port", "username", "ssl", "encryptedPassword" }`
/// plus the optional `description`, `namespace` and `pathPrefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProfile {
    /// Unique, case-sensitive identifier
    pub name: String,

    /// Host name or address of the server
    pub hostname: String,

    /// Web server port
    pub port: u16,

    /// Login user
    pub username: String,

    /// Whether to connect over TLS
    #[serde(rename = "ssl")]
    pub use_tls: bool,

    /// Password.
    ///
    /// Plaintext when handed to the store, empty when handed back by
    /// `list_profiles`/`get_profile`, and the stored form (an encrypted
    /// envelope, or plaintext in passthrough mode) on disk.
    #[serde(rename = "encryptedPassword", default)]
    pub password: String,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Default namespace on the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// URL path prefix when the server sits behind a shared web gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
}

impl ServerProfile {
    /// Create a profile with the required fields and no TLS
    pub fn new(
        name: impl Into<String>,
        hostname: impl Into<String>,
        port: u16,
        username: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
            port,
            username: username.into(),
            use_tls: false,
            password: String::new(),
            description: None,
            namespace: None,
            path_prefix: None,
        }
    }

    /// Set the password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Enable or disable TLS
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Copy of this profile with the password blanked out
    pub fn redacted(&self) -> Self {
        Self {
            password: String::new(),
            ..self.clone()
        }
    }

    /// URL scheme implied by `use_tls`
    pub fn scheme(&self) -> Scheme {
        if self.use_tls {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }

    /// Connection parameters for reaching this server
    pub fn server_spec(&self) -> ServerSpec {
        ServerSpec {
            host: self.hostname.clone(),
            port: self.port,
            scheme: self.scheme(),
            path_prefix: self.path_prefix.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

/// URL scheme used to reach a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a server lives, as handed to a connection tester
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSpec {
    pub host: String,
    pub port: u16,
    pub scheme: Scheme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ServerSpec {
    /// Base URL of the server, including any path prefix, without a
    /// trailing slash
    pub fn base_url(&self) -> String {
        let prefix = self
            .path_prefix
            .as_deref()
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
            .map(|p| format!("/{}", p))
            .unwrap_or_default();
        format!("{}://{}:{}{}", self.scheme, self.url_host(), self.port, prefix)
    }

    /// Host as it appears in a URL; IPv6 literals get brackets
    fn url_host(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }
}
