//! Password hashing with bcrypt.

use std::sync::OnceLock;

/// bcrypt work factor for stored hashes.
pub const HASH_COST: u32 = 10;

/// bcrypt only reads this many bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hash compared against when the account does not exist, so unknown emails
/// cost the same bcrypt round as a wrong password.
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

fn dummy_hash() -> Option<&'static str> {
    DUMMY_HASH
        .get_or_init(|| bcrypt::hash("quillpost-dummy-password", HASH_COST).ok())
        .as_deref()
}

/// Compute the dummy hash up front so the first unknown-email login does not
/// pay for it.
pub fn prepare() {
    dummy_hash();
}

/// Hash a plaintext password with a fresh salt.
/// Passwords longer than [`MAX_PASSWORD_BYTES`] are an error, never truncated.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::non_truncating_hash(password, HASH_COST)
}

/// Check a plaintext password against a stored hash.
/// A malformed stored hash or an over-long password counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::non_truncating_verify(password, hash).unwrap_or(false)
}

/// Burn one verification for a login attempt against a missing account.
pub fn verify_dummy(password: &str) {
    if let Some(hash) = dummy_hash() {
        let _ = bcrypt::verify(password, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("pw123456").unwrap();
        assert!(hash.starts_with("$2"));
        assert!(hash.contains("$10$"));
        assert!(verify_password("pw123456", &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_long_passwords_are_not_truncated() {
        let stored = "a".repeat(MAX_PASSWORD_BYTES);
        let hash = hash_password(&stored).unwrap();
        assert!(verify_password(&stored, &hash));

        let longer = format!("{}different-suffix", stored);
        assert!(!verify_password(&longer, &hash));
        assert!(hash_password(&longer).is_err());
    }

    #[test]
    fn test_prepare_computes_dummy_hash() {
        prepare();
        assert!(matches!(DUMMY_HASH.get(), Some(Some(_))));
    }

    #[test]
    fn test_malformed_hash_is_mismatch() {
        assert!(!verify_password("pw123456", "not-a-bcrypt-hash"));
    }
}
