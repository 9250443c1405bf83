/// Check a supplied credential against the stored one.
///
/// Byte-exact and case-sensitive: credentials are stored as given. This is the
/// only place a comparison happens, so moving to salted hashes means changing
/// this function and the write path, not the callers.
pub fn verify(stored: &str, supplied: &str) -> bool {
    stored.as_bytes() == supplied.as_bytes()
}
