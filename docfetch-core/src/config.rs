//! Client configuration.
//!
//! [`StoreConfig`] names the endpoint, the database/collection pair the client is bound to,
//! and the two internal time bounds (liveness check and cursor release). The defaults point
//! at a local server and the `r&d.users` collection.
//!
//! A config can be built in code, deserialized with serde, or read from the environment:
//!
//! ```ignore
//! use docfetch_core::config::StoreConfig;
//!
//! let config = StoreConfig::from_env()?.with_collection("customers");
//! config.validate()?;
//! ```

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, path::Path, time::Duration};

use crate::error::{FetchError, FetchResult};

pub const DEFAULT_ENDPOINT: &str = "mongodb://127.0.0.1:27017";
pub const DEFAULT_DATABASE: &str = "r&d";
pub const DEFAULT_COLLECTION: &str = "users";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_CLEANUP_TIMEOUT: Duration = Duration::from_secs(1);

const ENV_ENDPOINT: &str = "DOCFETCH_ENDPOINT";
const ENV_DATABASE: &str = "DOCFETCH_DATABASE";
const ENV_COLLECTION: &str = "DOCFETCH_COLLECTION";
const ENV_CONNECT_TIMEOUT_MS: &str = "DOCFETCH_CONNECT_TIMEOUT_MS";
const ENV_CLEANUP_TIMEOUT_MS: &str = "DOCFETCH_CLEANUP_TIMEOUT_MS";
const ENV_APP_NAME: &str = "DOCFETCH_APP_NAME";

const MAX_DATABASE_NAME_BYTES: usize = 63;
const FORBIDDEN_DATABASE_CHARS: [char; 7] = ['/', '\\', '.', '"', '$', ' ', '\0'];


/// The immutable `(database, collection)` pair a client reads from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub database: String,
    pub collection: String,
}

impl Locator {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// The `database.collection` namespace string used in logs.
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }
}

impl Default for Locator {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE, DEFAULT_COLLECTION)
    }
}

/// Everything needed to construct a client.
///
/// Every field is optional when deserializing; missing fields take the defaults.
/// Timeouts are expressed in milliseconds on the wire (`connect_timeout_ms`,
/// `cleanup_timeout_ms`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Connection string of the store, e.g. `mongodb://127.0.0.1:27017`.
    pub endpoint: String,
    /// Database the client reads from.
    pub database: String,
    /// Collection the client reads from.
    pub collection: String,
    /// Upper bound for the liveness check performed during construction.
    #[serde(rename = "connect_timeout_ms", with = "millis")]
    pub connect_timeout: Duration,
    /// Upper bound for releasing a cursor, independent of any caller deadline.
    #[serde(rename = "cleanup_timeout_ms", with = "millis")]
    pub cleanup_timeout: Duration,
    /// Application name reported to the server, if any.
    pub app_name: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            cleanup_timeout: DEFAULT_CLEANUP_TIMEOUT,
            app_name: None,
        }
    }
}

impl StoreConfig {
    /// Reads the configuration from `DOCFETCH_*` environment variables.
    ///
    /// A `.env` file in the working directory or its parents is loaded first, without
    /// overriding variables that are already set. Unset variables fall back to the
    /// defaults. A timeout that is set but not a non-negative integer is a
    /// [`FetchError::Config`].
    pub fn from_env() -> FetchResult<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration from a dotenv-style file, leaving the process
    /// environment untouched.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Config`] if the file cannot be read or parsed, or if a
    /// timeout in it is not a millisecond count.
    pub fn from_env_file(path: impl AsRef<Path>) -> FetchResult<Self> {
        let path = path.as_ref();
        let vars = dotenvy::from_path_iter(path)
            .and_then(|iter| iter.collect::<Result<HashMap<String, String>, _>>())
            .map_err(|e| FetchError::Config(format!("cannot load {}: {e}", path.display())))?;

        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> FetchResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            endpoint: lookup(ENV_ENDPOINT).unwrap_or(defaults.endpoint),
            database: lookup(ENV_DATABASE).unwrap_or(defaults.database),
            collection: lookup(ENV_COLLECTION).unwrap_or(defaults.collection),
            connect_timeout: parse_millis(ENV_CONNECT_TIMEOUT_MS, lookup(ENV_CONNECT_TIMEOUT_MS))?
                .unwrap_or(defaults.connect_timeout),
            cleanup_timeout: parse_millis(ENV_CLEANUP_TIMEOUT_MS, lookup(ENV_CLEANUP_TIMEOUT_MS))?
                .unwrap_or(defaults.cleanup_timeout),
            app_name: lookup(ENV_APP_NAME).filter(|name| !name.is_empty()),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_cleanup_timeout(mut self, timeout: Duration) -> Self {
        self.cleanup_timeout = timeout;
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    /// The locator this configuration binds a client to.
    pub fn locator(&self) -> Locator {
        Locator::new(self.database.clone(), self.collection.clone())
    }

    /// Checks the configuration against the store's naming rules.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Config`] describing the first violation found.
    pub fn validate(&self) -> FetchResult<()> {
        validate_endpoint(&self.endpoint)?;
        validate_database_name(&self.database)?;
        validate_collection_name(&self.collection)?;

        if self.connect_timeout.is_zero() {
            return Err(FetchError::Config("connect timeout must be greater than zero".into()));
        }
        if self.cleanup_timeout.is_zero() {
            return Err(FetchError::Config("cleanup timeout must be greater than zero".into()));
        }

        Ok(())
    }
}

fn validate_endpoint(endpoint: &str) -> FetchResult<()> {
    if endpoint.trim().is_empty() {
        return Err(FetchError::Config("endpoint must not be empty".into()));
    }
    if !endpoint.starts_with("mongodb://") && !endpoint.starts_with("mongodb+srv://") {
        return Err(FetchError::Config(format!(
            "endpoint {endpoint:?} must use the mongodb:// or mongodb+srv:// scheme"
        )));
    }

    Ok(())
}

fn validate_database_name(name: &str) -> FetchResult<()> {
    if name.is_empty() {
        return Err(FetchError::Config("database name must not be empty".into()));
    }
    if name.len() > MAX_DATABASE_NAME_BYTES {
        return Err(FetchError::Config(format!(
            "database name {name:?} exceeds {MAX_DATABASE_NAME_BYTES} bytes"
        )));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_DATABASE_CHARS.contains(c)) {
        return Err(FetchError::Config(format!(
            "database name {name:?} contains forbidden character {c:?}"
        )));
    }

    Ok(())
}

fn validate_collection_name(name: &str) -> FetchResult<()> {
    if name.is_empty() {
        return Err(FetchError::Config("collection name must not be empty".into()));
    }
    if name.contains('$') || name.contains('\0') {
        return Err(FetchError::Config(format!(
            "collection name {name:?} must not contain '$' or NUL"
        )));
    }
    if name.starts_with("system.") {
        return Err(FetchError::Config(format!(
            "collection name {name:?} uses the reserved system. prefix"
        )));
    }

    Ok(())
}

fn parse_millis(key: &str, value: Option<String>) -> FetchResult<Option<Duration>> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| {
                    FetchError::Config(format!("{key}={raw:?} is not a millisecond count: {e}"))
                })
        })
        .transpose()
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
