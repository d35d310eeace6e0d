//! Client configuration.
//!
//! Read from environment variables, falling back to defaults:
//! - `WYLAB_SERVER_URL`: compiler service base URL (default: "http://localhost:8080")
//! - `WYLAB_DB_PATH`: session database file (default: "wylab.db", ":memory:" for none)
//! - `WYLAB_REQUEST_ENCODING`: "form" or "json" (default: "form")
//! - `WYLAB_TIMEOUT_SECS`: per-request timeout in seconds (default: none)
//! - `WYLAB_NODE`: JavaScript runtime for running artifacts (default: "node")

use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";
pub const DEFAULT_DB_PATH: &str = "wylab.db";
pub const DEFAULT_NODE_PROGRAM: &str = "node";

/// Database path that selects a throwaway in-memory store.
pub const IN_MEMORY_DB: &str = ":memory:";

/// How the compile request body is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestEncoding {
    /// `application/x-www-form-urlencoded`, as the reference service parses it.
    #[default]
    Form,
    /// A JSON object with the same three fields.
    Json,
}

impl FromStr for RequestEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "form" => Ok(RequestEncoding::Form),
            "json" => Ok(RequestEncoding::Json),
            other => Err(format!(
                "invalid request encoding '{}', expected form or json",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub db_path: String,
    pub encoding: RequestEncoding,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
    pub node_program: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server_url: DEFAULT_SERVER_URL.to_string(),
            db_path: DEFAULT_DB_PATH.to_string(),
            encoding: RequestEncoding::Form,
            timeout: None,
            node_program: DEFAULT_NODE_PROGRAM.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source. Unparseable values
    /// are logged and replaced by their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ClientConfig::default();

        if let Some(url) = lookup("WYLAB_SERVER_URL") {
            config.server_url = url;
        }
        if let Some(path) = lookup("WYLAB_DB_PATH") {
            config.db_path = path;
        }
        if let Some(raw) = lookup("WYLAB_REQUEST_ENCODING") {
            match raw.parse() {
                Ok(encoding) => config.encoding = encoding,
                Err(err) => tracing::warn!(%err, "ignoring WYLAB_REQUEST_ENCODING"),
            }
        }
        if let Some(raw) = lookup("WYLAB_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Some(Duration::from_secs(secs)),
                _ => tracing::warn!(value = %raw, "ignoring WYLAB_TIMEOUT_SECS, expected a positive integer"),
            }
        }
        if let Some(program) = lookup("WYLAB_NODE") {
            config.node_program = program;
        }

        config
    }

    /// URL that compile requests are posted to.
    pub fn compile_endpoint(&self) -> String {
        format!("{}/compile", self.server_url.trim_end_matches('/'))
    }

    pub fn uses_in_memory_store(&self) -> bool {
        self.db_path == IN_MEMORY_DB
    }
}
