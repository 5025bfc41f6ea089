//! Service registry: the named services a completion can be routed to.
//!
//! The service map lives in `services.toml` inside the relay config directory
//! (see [`config_dir`]). It is read lazily on first use, validated, and cached in
//! the owning [`ServiceRegistry`] until [`ServiceRegistry::reset`] is called.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LLMError;

/// Environment variable overriding the relay config directory.
pub const CONFIG_DIR_ENV: &str = "LLM_RELAY_HOME";
/// File name of the service map inside the config directory.
pub const SERVICES_FILE: &str = "services.toml";
/// File name of the optional price table inside the config directory.
pub const PRICING_FILE: &str = "pricing.toml";

const DEFAULT_SERVICES_TOML: &str = r#"# Services available to llm-relay.
# Each [services.<name>] table needs `adapter` and `base_url`.
# `key` names the credential to look up; set `key_required = false` for local models.
default_service = "anthropic"

[services.anthropic]
adapter = "anthropic"
key = "ANTHROPIC_API_KEY"
base_url = "https://api.anthropic.com"
default_model = "claude-sonnet-4-5"

[services.openai]
adapter = "openai"
key = "OPENAI_API_KEY"
base_url = "https://api.openai.com"
default_model = "gpt-4o-mini"

[services.ollama]
adapter = "ollama"
base_url = "http://localhost:11434"
key_required = false
default_model = "llama3.2"
"#;

/// Configuration of one named service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Adapter kind, e.g. `anthropic`, `openai`, `ollama`, `gemini`.
    pub adapter: String,
    pub base_url: String,
    /// Logical credential name handed to the credential provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default = "default_key_required")]
    pub key_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

fn default_key_required() -> bool {
    true
}

/// Validated service map: a default service name plus every declared service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceMap {
    pub default_service: String,
    pub services: BTreeMap<String, ServiceConfig>,
}

/// A service configuration together with the name it was resolved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedService {
    pub name: String,
    pub config: ServiceConfig,
}

/// On-disk shape; fields are optional so that validation can name what is missing.
#[derive(Debug, Deserialize)]
struct RawServiceMap {
    default_service: Option<String>,
    #[serde(default)]
    services: BTreeMap<String, RawServiceConfig>,
}

#[derive(Debug, Deserialize)]
struct RawServiceConfig {
    adapter: Option<String>,
    base_url: Option<String>,
    key: Option<String>,
    #[serde(default = "default_key_required")]
    key_required: bool,
    default_model: Option<String>,
}

impl ServiceMap {
    /// Parses and validates service map text read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LLMError::Config`] naming `path` when the text is not valid TOML,
    /// a service lacks `adapter` or `base_url`, or `default_service` does not name
    /// a declared service.
    pub fn parse(text: &str, path: &Path) -> Result<Self, LLMError> {
        let raw: RawServiceMap = toml::from_str(text).map_err(|err| LLMError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        let invalid = |message: String| LLMError::Config {
            path: path.to_path_buf(),
            message,
        };

        let mut services = BTreeMap::new();
        for (name, entry) in raw.services {
            let adapter = non_empty(entry.adapter)
                .ok_or_else(|| invalid(format!("service `{name}` is missing `adapter`")))?;
            let base_url = non_empty(entry.base_url)
                .ok_or_else(|| invalid(format!("service `{name}` is missing `base_url`")))?;
            services.insert(
                name,
                ServiceConfig {
                    adapter,
                    base_url,
                    key: non_empty(entry.key),
                    key_required: entry.key_required,
                    default_model: non_empty(entry.default_model),
                },
            );
        }

        let default_service = non_empty(raw.default_service)
            .ok_or_else(|| invalid("missing top-level `default_service`".to_string()))?;

        let map = Self {
            default_service,
            services,
        };
        map.validate().map_err(invalid)?;
        Ok(map)
    }

    /// Checks the invariants that hold for every usable service map.
    fn validate(&self) -> Result<(), String> {
        for (name, service) in &self.services {
            if service.adapter.trim().is_empty() {
                return Err(format!("service `{name}` is missing `adapter`"));
            }
            if service.base_url.trim().is_empty() {
                return Err(format!("service `{name}` is missing `base_url`"));
            }
        }
        if !self.services.contains_key(&self.default_service) {
            return Err(format!(
                "default_service `{}` is not declared; declared services: {}",
                self.default_service,
                self.names().join(", ")
            ));
        }
        Ok(())
    }

    /// Service names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    /// Resolves `name`, or the default service when `name` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`LLMError::UnknownService`] listing every known name.
    pub fn resolve(&self, name: Option<&str>) -> Result<NamedService, LLMError> {
        let name = name.unwrap_or(&self.default_service);
        self.services
            .get(name)
            .map(|config| NamedService {
                name: name.to_string(),
                config: config.clone(),
            })
            .ok_or_else(|| LLMError::UnknownService {
                name: name.to_string(),
                known: self.names(),
            })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

enum Source {
    File(PathBuf),
    Memory(ServiceMap),
}

/// Owns the service map for one relay context.
///
/// File-backed registries read `services.toml` on the first call to
/// [`load`](Self::load), writing the built-in defaults first when the file does not
/// exist. The parsed map is cached until [`reset`](Self::reset). Several relays may
/// share one registry through an `Arc`; tests can build isolated registries with
/// [`from_path`](Self::from_path) or [`from_map`](Self::from_map).
pub struct ServiceRegistry {
    source: Source,
    cache: RwLock<Option<Arc<ServiceMap>>>,
}

impl ServiceRegistry {
    /// Registry backed by `services.toml` in the default config directory.
    ///
    /// # Errors
    ///
    /// Returns [`LLMError::Config`] when no config directory can be determined.
    pub fn from_default_location() -> Result<Self, LLMError> {
        Ok(Self::from_path(config_dir()?.join(SERVICES_FILE)))
    }

    /// Registry backed by the given service map file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
            cache: RwLock::new(None),
        }
    }

    /// In-memory registry over an already-built map.
    ///
    /// # Errors
    ///
    /// Returns [`LLMError::Config`] when the map violates the same invariants a file
    /// would be checked against.
    pub fn from_map(map: ServiceMap) -> Result<Self, LLMError> {
        map.validate().map_err(|message| LLMError::Config {
            path: PathBuf::from("<memory>"),
            message,
        })?;
        Ok(Self {
            source: Source::Memory(map),
            cache: RwLock::new(None),
        })
    }

    /// Location of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            Source::File(path) => Some(path),
            Source::Memory(_) => None,
        }
    }

    /// Returns the cached service map, loading it on first use.
    pub fn load(&self) -> Result<Arc<ServiceMap>, LLMError> {
        if let Some(map) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(map));
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(map) = cache.as_ref() {
            return Ok(Arc::clone(map));
        }

        let map = Arc::new(match &self.source {
            Source::File(path) => load_or_create(path)?,
            Source::Memory(map) => map.clone(),
        });
        *cache = Some(Arc::clone(&map));
        Ok(map)
    }

    /// Resolves a service by name, or the default service when `name` is `None`.
    pub fn resolve(&self, name: Option<&str>) -> Result<NamedService, LLMError> {
        let service = self.load()?.resolve(name)?;
        debug!(service = %service.name, adapter = %service.config.adapter, "resolved service");
        Ok(service)
    }

    /// Configured service names in sorted order.
    pub fn list(&self) -> Result<Vec<String>, LLMError> {
        Ok(self.load()?.names())
    }

    /// Drops the cached map; the next access re-reads the source.
    ///
    /// Intended for test isolation, not for concurrent use alongside live requests.
    pub fn reset(&self) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

fn load_or_create(path: &Path) -> Result<ServiceMap, LLMError> {
    match fs::read_to_string(path) {
        Ok(text) => ServiceMap::parse(&text, path),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no service config found, writing defaults");
            if let Err(err) = write_defaults(path) {
                warn!(path = %path.display(), error = %err, "could not persist default service config");
            }
            ServiceMap::parse(DEFAULT_SERVICES_TOML, path)
        }
        Err(err) => Err(LLMError::Config {
            path: path.to_path_buf(),
            message: format!("failed to read: {err}"),
        }),
    }
}

fn write_defaults(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, DEFAULT_SERVICES_TOML)
}

/// Resolves the relay config directory.
///
/// Uses `LLM_RELAY_HOME` when set, otherwise `<platform config dir>/llm-relay`.
pub fn config_dir() -> Result<PathBuf, LLMError> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|dir| dir.join("llm-relay"))
        .ok_or_else(|| LLMError::Config {
            path: PathBuf::from(SERVICES_FILE),
            message: format!("cannot determine a config directory; set {CONFIG_DIR_ENV}"),
        })
}
