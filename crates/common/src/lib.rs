//! Shared building blocks for the save server crates.
//!
//! Response envelopes, logging initialisation and startup checks live here so
//! the binary, the HTTP adapter and the store agree on them.

pub mod types;
pub mod utils;
pub mod env;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health::healthy();
        assert_eq!(h.status, "healthy");
        let v = serde_json::to_value(&h).unwrap();
        assert_eq!(v["status"], "healthy");
        assert!(v["message"].as_str().is_some());
    }
}
