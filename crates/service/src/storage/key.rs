//! Username → storage location mapping.
//!
//! The username is the storage key verbatim, so anything that could steer a
//! derived file path somewhere else is rejected up front instead of escaped.

use std::fmt;

use crate::errors::StoreError;

/// Longest accepted username, in bytes.
pub const MAX_KEY_LEN: usize = 128;

/// A validated username, safe to turn into a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn parse(username: &str) -> Result<Self, StoreError> {
        if username.is_empty() {
            return Err(StoreError::invalid("username must not be empty"));
        }
        if username.len() > MAX_KEY_LEN {
            return Err(StoreError::invalid(format!("username longer than {MAX_KEY_LEN} bytes")));
        }
        // leading dot is reserved for temp files
        if username.starts_with('.') || username.contains("..") {
            return Err(StoreError::invalid("username must not start with '.' or contain '..'"));
        }
        if let Some(c) = username.chars().find(|c| matches!(c, '/' | '\\') || c.is_control()) {
            return Err(StoreError::invalid(format!(
                "username contains forbidden character {:?}",
                c
            )));
        }
        Ok(Self(username.to_owned()))
    }

    pub fn as_str(&self) -> &str { &self.0 }

    pub fn file_name(&self) -> String { format!("{}.json", self.0) }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}
