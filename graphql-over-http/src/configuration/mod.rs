//! Logic for loading configuration in to an object model

use std::net::SocketAddr;
use std::str::FromStr;

use displaydoc::Display;
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use schemars::schema::RootSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::batching::Batching;
use crate::file_uploads::FileUploadsConfig;


/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not deserialize configuration: {0}
    DeserializeConfigError(serde_yaml::Error),

    /// {message}: {error}
    InvalidConfiguration {
        message: &'static str,
        error: String,
    },
}

/// The configuration of the HTTP layer.
///
/// Can be created through `serde::Deserialize` from various formats, with [`FromStr`] from
/// YAML, or inline in Rust code with the builder.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Configuration options pertaining to the http server component.
    pub(crate) server: Server,

    /// Lists of operations in a single request.
    pub(crate) batching: Batching,

    /// Files sent along operations as multipart requests.
    pub(crate) file_uploads: FileUploadsConfig,

    /// Limits on incoming requests.
    pub(crate) limits: Limits,

    /// Include the cause of internal errors in responses (default: false)
    pub(crate) expose_internal_errors: bool,
}

#[buildstructor::buildstructor]
impl Configuration {
    #[builder(visibility = "pub")]
    fn new(
        server: Option<Server>,
        batching: Option<Batching>,
        file_uploads: Option<FileUploadsConfig>,
        limits: Option<Limits>,
        expose_internal_errors: Option<bool>,
    ) -> Result<Self, ConfigurationError> {
        let configuration = Self {
            server: server.unwrap_or_default(),
            batching: batching.unwrap_or_default(),
            file_uploads: file_uploads.unwrap_or_default(),
            limits: limits.unwrap_or_default(),
            expose_internal_errors: expose_internal_errors.unwrap_or_default(),
        };
        configuration.validate()?;
        Ok(configuration)
    }

    /// Checks the values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.server.path.starts_with('/') {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "invalid 'server.path' configuration",
                error: format!("'{}' does not start with '/'", self.server.path),
            });
        }
        if self.batching.maximum_size == Some(0) {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "invalid 'batching.maximum_size' configuration",
                error: "a batch must be allowed at least one operation".to_string(),
            });
        }
        if self.limits.http_max_request_bytes == 0 {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "invalid 'limits.http_max_request_bytes' configuration",
                error: "the limit must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn listen(&self) -> SocketAddr {
        self.server.listen
    }

    pub fn path(&self) -> &str {
        &self.server.path
    }
}

/// Parses and validates YAML configuration. An empty document is the default configuration.
impl FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let configuration: Configuration = if s.trim().is_empty() {
            Configuration::default()
        } else {
            serde_yaml::from_str(s).map_err(ConfigurationError::DeserializeConfigError)?
        };
        configuration.validate()?;
        Ok(configuration)
    }
}

/// Configuration options pertaining to the http server component.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Server {
    /// The socket address and port to listen on
    /// Defaults to 127.0.0.1:4000
    pub(crate) listen: SocketAddr,

    /// The HTTP path on which GraphQL requests will be served.
    /// default: "/graphql"
    pub(crate) path: String,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 4000))
}

fn default_graphql_path() -> String {
    String::from("/graphql")
}

impl Default for Server {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_graphql_path(),
        }
    }
}

#[buildstructor::buildstructor]
impl Server {
    #[builder(visibility = "pub")]
    fn new(listen: Option<SocketAddr>, path: Option<String>) -> Self {
        Self {
            listen: listen.unwrap_or_else(default_listen),
            path: path.unwrap_or_else(default_graphql_path),
        }
    }
}

/// Limits on incoming requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Limits {
    /// Limit the size of incoming HTTP requests read from the network,
    /// to protect against running out of memory. Default: 2000000 (2 MB)
    pub(crate) http_max_request_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            http_max_request_bytes: 2_000_000,
        }
    }
}

#[buildstructor::buildstructor]
impl Limits {
    #[builder(visibility = "pub")]
    fn new(http_max_request_bytes: Option<usize>) -> Self {
        Self {
            http_max_request_bytes: http_max_request_bytes
                .unwrap_or(Self::default().http_max_request_bytes),
        }
    }
}

/// Generate a JSON schema for the configuration.
pub fn generate_config_schema() -> RootSchema {
    let settings = SchemaSettings::draft07().with(|s| {
        s.option_nullable = true;
        s.option_add_null_type = false;
        s.inline_subschemas = true;
    });
    settings.into_generator().into_root_schema_for::<Configuration>()
}
