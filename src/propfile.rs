// Property File Parser
// Parses simple key=value property files used for configuration

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

/// Parse property file text, invoking `handler` for each key-value pair.
///
/// Keys keep their case. `#` starts a comment anywhere on a line, and
/// whitespace around keys and values is trimmed. Lines without `=` are
/// skipped with a warning.
pub fn parse_propfile(data: &str, handler: &mut dyn FnMut(&str, &str)) {
    const NL: u8 = b'\x0A';
    const HASH: u8 = b'#';
    const EQ: u8 = b'=';

    let bytes = data.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    let mut line = 1usize;

    while i < len {
        while i < len && bytes[i].is_ascii_whitespace() {
            if bytes[i] == NL {
                line += 1;
            }
            i += 1;
        }
        if i >= len {
            break;
        }

        if bytes[i] == HASH {
            while i < len && bytes[i] != NL {
                i += 1;
            }
            continue;
        }

        let key_start = i;
        while i < len && bytes[i] != EQ && bytes[i] != NL && bytes[i] != HASH {
            i += 1;
        }

        if i >= len || bytes[i] != EQ {
            let mut key_end = i;
            while key_end > key_start && bytes[key_end - 1].is_ascii_whitespace() {
                key_end -= 1;
            }
            tracing::warn!(line, key = &data[key_start..key_end], "Key without value");
            while i < len && bytes[i] != NL {
                i += 1;
            }
            continue;
        }

        let mut key_end = i;
        while key_end > key_start && bytes[key_end - 1].is_ascii_whitespace() {
            key_end -= 1;
        }
        let key = &data[key_start..key_end];

        i += 1;

        while i < len && bytes[i] != HASH && bytes[i] != NL && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let value_start = i;

        while i < len && bytes[i] != HASH && bytes[i] != NL {
            i += 1;
        }
        let mut value_end = i;

        while value_end > value_start && bytes[value_end - 1].is_ascii_whitespace() {
            value_end -= 1;
        }
        let value = &data[value_start..value_end];

        while i < len && bytes[i] != NL {
            i += 1;
        }

        handler(key, value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyError {
    FileNotFound,
    IoError,
}

impl std::fmt::Display for PropertyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyError::FileNotFound => write!(f, "Property file not found"),
            PropertyError::IoError => write!(f, "I/O error reading property file"),
        }
    }
}

impl std::error::Error for PropertyError {}

impl From<io::Error> for PropertyError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => PropertyError::FileNotFound,
            _ => PropertyError::IoError,
        }
    }
}

/// Key-value pairs from a property file
///
/// Lookups are case-insensitive; keys are stored lowercased.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyFile {
    properties: BTreeMap<String, String>,
}

impl PropertyFile {
    /// Load a property file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PropertyError> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Parse property file text. Later duplicates win.
    pub fn parse(content: &str) -> Self {
        let mut properties = BTreeMap::new();
        parse_propfile(content, &mut |key, value| {
            if !key.is_empty() {
                properties.insert(key.to_lowercase(), value.to_string());
            }
        });
        PropertyFile { properties }
    }

    /// Get a property value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Get a property value with a default
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Set a property value
    pub fn set(&mut self, key: &str, value: &str) {
        self.properties.insert(key.to_lowercase(), value.to_string());
    }

    /// Check if a property exists
    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(&key.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterate over all properties in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
