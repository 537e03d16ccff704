//! Credential handling. Only bcrypt hashes ever reach storage.

use bcrypt::{hash, verify};

use crate::error::Result;
use crate::models::UserRecord;

pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    Ok(hash(password.as_bytes(), cost)?)
}

/// Checks `password` against the stored hash of `user`. A hash that bcrypt
/// cannot parse counts as a mismatch. With no user, a hash of the same cost is
/// still computed so an unknown email takes as long as a wrong password.
pub fn check_credentials(user: Option<&UserRecord>, password: &str, cost: u32) -> bool {
    match user {
        Some(user) => verify(password.as_bytes(), &user.password_hash).unwrap_or(false),
        None => {
            let _ = hash(password.as_bytes(), cost);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user_with_hash(password_hash: String) -> UserRecord {
        UserRecord {
            user_id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            birth_date: None,
            password_hash,
        }
    }

    #[test]
    fn hash_is_salted_and_verifies() {
        let first = hash_password("password1", 4).unwrap();
        let second = hash_password("password1", 4).unwrap();
        assert_ne!(first, second);
        assert_ne!(first, "password1");

        let user = user_with_hash(first);
        assert!(check_credentials(Some(&user), "password1", 4));
        assert!(!check_credentials(Some(&user), "password2", 4));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        let user = user_with_hash("password1".to_string());
        assert!(!check_credentials(Some(&user), "password1", 4));
    }

    #[test]
    fn unknown_user_never_verifies() {
        assert!(!check_credentials(None, "password1", 4));
    }
}
