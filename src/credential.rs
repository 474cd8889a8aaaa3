use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An argon2 PHC string. The clear-text password is never kept.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn hash(password: &str) -> anyhow::Result<Self> {
        let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
            .map_err(|e| anyhow::anyhow!("failed to encode salt: {e}"))?;
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
        Ok(Self(phc.to_string()))
    }

    pub fn verify(&self, password: &str) -> bool {
        match PasswordHash::new(&self.0) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// True when the stored text parses as a PHC string.
    pub fn is_well_formed(&self) -> bool {
        PasswordHash::new(&self.0).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::Credential;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let c = Credential::hash("s3cret").expect("hash");
        assert!(c.as_str().starts_with("$argon2"));
        assert!(!c.as_str().contains("s3cret"));
        assert!(c.verify("s3cret"));
        assert!(!c.verify("S3cret"));
        assert!(c.is_well_formed());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = Credential::hash("pw").expect("hash a");
        let b = Credential::hash("pw").expect("hash b");
        assert_ne!(a, b);
    }

    #[test]
    fn plaintext_value_is_not_a_credential() {
        let c: Credential = serde_json::from_str("\"encrypted1\"").expect("parse");
        assert!(!c.is_well_formed());
        assert!(!c.verify("encrypted1"));
    }
}
