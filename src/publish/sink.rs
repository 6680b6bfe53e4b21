//! Telemetry sinks
//!
//! A sink stores the latest payload per key, overwritten on every write.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

/// Key-value server the publisher talks to unless configured otherwise
pub const DEFAULT_TELEMETRY_URL: &str = "redis://127.0.0.1:6379/0";

/// How long the startup connection check may take
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid telemetry key '{0}'")]
    InvalidKey(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for published frames
pub trait TelemetrySink: Send + Sync {
    /// Replace the value stored under `key`
    fn write(&self, key: &str, payload: &str) -> SinkResult<()>;

    /// False when the sink knows writes cannot succeed; the publisher skips
    /// its ticks instead of failing them
    fn is_online(&self) -> bool {
        true
    }
}

/// In-process sink keeping the last value per key
#[derive(Debug, Default)]
pub struct MemorySink {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }
}

impl TelemetrySink for MemorySink {
    fn write(&self, key: &str, payload: &str) -> SinkResult<()> {
        self.values.write().insert(key.to_string(), payload.to_string());
        Ok(())
    }
}

/// Sink writing one `<key>.json` file per key
///
/// Each write goes to a temp file first and is renamed over the target, so a
/// reader never sees a partial frame.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// Create the sink, making `dir` if needed
    pub fn new(dir: impl Into<PathBuf>) -> SinkResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the value for `key` is written to
    pub fn path_for(&self, key: &str) -> SinkResult<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(SinkError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl TelemetrySink for FileSink {
    fn write(&self, key: &str, payload: &str) -> SinkResult<()> {
        let path = self.path_for(key)?;
        let temp_path = path.with_extension("json.tmp");

        std::fs::write(&temp_path, payload.as_bytes())?;
        std::fs::rename(&temp_path, &path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            SinkError::Io(e)
        })?;
        Ok(())
    }
}

/// Sink issuing `SET <key> <payload>` against a Redis server
///
/// The server is pinged once when the sink is created. If that fails the
/// sink stays offline for its whole lifetime, and so does a sink whose
/// connection breaks later. No reconnect is attempted.
pub struct RedisSink {
    url: String,
    conn: Mutex<Option<redis::Connection>>,
}

impl RedisSink {
    /// Open `url` and check the server answers. An unreachable server gives
    /// an offline sink; a malformed URL is an error.
    pub fn connect(url: &str) -> SinkResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = match Self::ping(&client) {
            Ok(conn) => {
                tracing::info!(url, "Connected to telemetry server");
                Some(conn)
            }
            Err(e) => {
                tracing::warn!(
                    url,
                    error = %e,
                    "Could not connect to telemetry server, publishing disabled"
                );
                None
            }
        };
        Ok(Self {
            url: url.to_string(),
            conn: Mutex::new(conn),
        })
    }

    fn ping(client: &redis::Client) -> redis::RedisResult<redis::Connection> {
        let mut conn = client.get_connection_with_timeout(CONNECT_TIMEOUT)?;
        redis::cmd("PING").query::<String>(&mut conn)?;
        Ok(conn)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl TelemetrySink for RedisSink {
    fn write(&self, key: &str, payload: &str) -> SinkResult<()> {
        let mut guard = self.conn.lock();
        let conn = guard
            .as_mut()
            .ok_or_else(|| SinkError::Unavailable(format!("not connected to {}", self.url)))?;
        match redis::cmd("SET").arg(key).arg(payload).query::<()>(conn) {
            Ok(()) => Ok(()),
            Err(e) => {
                if e.is_connection_dropped() || e.is_io_error() {
                    tracing::error!(url = %self.url, error = %e, "Telemetry connection lost");
                    *guard = None;
                }
                Err(SinkError::Redis(e))
            }
        }
    }

    fn is_online(&self) -> bool {
        self.conn.lock().is_some()
    }
}
