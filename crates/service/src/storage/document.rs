use serde_json::Value;

use super::credential;
use super::key::RecordKey;
use crate::errors::StoreError;

/// Names of the two reserved document fields. Everything else in a document
/// is game payload the store passes through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFields {
    pub username: String,
    pub credential: String,
}

impl Default for RecordFields {
    fn default() -> Self {
        Self { username: "username".into(), credential: "credential".into() }
    }
}

impl RecordFields {
    pub fn new(username: impl Into<String>, credential: impl Into<String>) -> Self {
        Self { username: username.into(), credential: credential.into() }
    }

    /// Document must be an object; an embedded username must equal the key.
    pub fn check_identity(&self, key: &RecordKey, doc: &Value) -> Result<(), StoreError> {
        let obj = doc
            .as_object()
            .ok_or_else(|| StoreError::invalid("document must be a JSON object"))?;
        match obj.get(&self.username) {
            None => Ok(()),
            Some(Value::String(s)) if s == key.as_str() => Ok(()),
            Some(Value::String(s)) => Err(StoreError::invalid(format!(
                "document {} {:?} does not match key {:?}",
                self.username,
                s,
                key.as_str()
            ))),
            Some(_) => Err(StoreError::invalid(format!("{} must be a string", self.username))),
        }
    }

    /// Checks for a brand-new record: identity plus a string credential (may be empty).
    pub fn check_new(&self, key: &RecordKey, doc: &Value) -> Result<(), StoreError> {
        self.check_identity(key, doc)?;
        match doc.get(&self.credential) {
            Some(Value::String(_)) => Ok(()),
            Some(_) => Err(StoreError::invalid(format!("{} must be a string", self.credential))),
            None => Err(StoreError::invalid(format!("missing {}", self.credential))),
        }
    }

    /// Stored credential of a document, if it has a string one.
    pub fn credential_of<'a>(&self, doc: &'a Value) -> Option<&'a str> {
        doc.get(&self.credential).and_then(Value::as_str)
    }

    /// Compare `supplied` with the stored credential. A record without one never matches.
    pub fn authorize(&self, doc: &Value, supplied: &str) -> Result<(), StoreError> {
        match self.credential_of(doc) {
            Some(stored) if credential::verify(stored, supplied) => Ok(()),
            _ => Err(StoreError::InvalidCredential),
        }
    }

    /// Required non-empty string field of a request body (username or credential).
    pub fn required_str<'a>(&self, body: &'a Value, field: &str) -> Result<&'a str, StoreError> {
        match body.get(field).and_then(Value::as_str) {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(StoreError::invalid(format!("{field} must not be empty"))),
        }
    }

    pub fn username_of<'a>(&self, body: &'a Value) -> Result<&'a str, StoreError> {
        self.required_str(body, &self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(s: &str) -> RecordKey { RecordKey::parse(s).unwrap() }

    #[test]
    fn identity_must_match_key() {
        let f = RecordFields::default();
        assert!(f.check_identity(&key("alice"), &json!({"username": "alice"})).is_ok());
        assert!(f.check_identity(&key("alice"), &json!({"money": 1})).is_ok());
        assert!(f.check_identity(&key("alice"), &json!({"username": "bob"})).is_err());
        assert!(f.check_identity(&key("alice"), &json!({"username": 7})).is_err());
        assert!(f.check_identity(&key("alice"), &json!([1, 2])).is_err());
    }

    #[test]
    fn new_record_needs_string_credential() {
        let f = RecordFields::default();
        assert!(f.check_new(&key("a"), &json!({"credential": ""})).is_ok());
        assert!(f.check_new(&key("a"), &json!({"credential": 12})).is_err());
        assert!(f.check_new(&key("a"), &json!({"farm_name": "Green"})).is_err());
    }

    #[test]
    fn authorize_uses_configured_field() {
        let f = RecordFields::new("user_name", "user_password");
        let doc = json!({"user_name": "a", "user_password": "p1"});
        assert!(f.authorize(&doc, "p1").is_ok());
        assert!(matches!(f.authorize(&doc, "p2"), Err(StoreError::InvalidCredential)));
        assert!(matches!(f.authorize(&json!({"user_name": "a"}), ""), Err(StoreError::InvalidCredential)));
        assert_eq!(f.username_of(&doc).unwrap(), "a");
        assert!(f.username_of(&json!({"user_name": ""})).is_err());
    }
}
