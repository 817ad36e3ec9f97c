//! User entity, field validation, and credential hashing

use super::types::{Timestamp, UserId};
use super::validation::{FieldError, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// bcrypt cost factor applied when a password is hashed
const HASH_COST: u32 = 9;

/// Minimum accepted username length
const USERNAME_MIN_LEN: usize = 3;

/// Host used to derive avatar URLs from usernames
const AVATAR_HOST: &str = "https://robohash.org";

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("email pattern is valid")
});

static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("username pattern is valid"));

/// Registration draft for a user
///
/// The only place a plaintext password lives. Validation runs against the
/// draft; hashing happens when the draft is turned into a [`User`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl NewUser {
    /// Check every field constraint, collecting all failures
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        if self.email.is_empty() {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !EMAIL_PATTERN.is_match(&self.email) {
            errors.push(FieldError::new("email", "Please fill a valid email address"));
        }

        if self.username.is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        } else {
            if self.username.len() < USERNAME_MIN_LEN {
                errors.push(FieldError::new(
                    "username",
                    "Username must be at least 3 characters",
                ));
            }
            if !USERNAME_PATTERN.is_match(&self.username) {
                errors.push(FieldError::new(
                    "username",
                    "Username must contain only letters and numbers",
                ));
            }
        }

        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(errors))
        }
    }
}

/// A registered user
///
/// The `password` field always holds a bcrypt hash. Plaintext exists only in
/// the [`NewUser`] draft and in `set_password` arguments, both of which hash
/// immediately, so a save that does not change the password can never hash
/// twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub password: String,
    pub avatar: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Build a persistable user from a registration draft
    ///
    /// Hashes the password with a fresh random salt and derives the avatar
    /// from the username. Field validation is the store's concern and runs
    /// before this.
    pub fn from_draft(draft: &NewUser) -> Result<Self, bcrypt::BcryptError> {
        let now = Timestamp::now();
        Ok(User {
            id: UserId::generate(),
            email: draft.email.clone(),
            username: draft.username.clone(),
            password: hash_password(&draft.password)?,
            avatar: avatar_url(&draft.username),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the password, hashing the new value
    pub fn set_password(&mut self, plaintext: &str) -> Result<(), bcrypt::BcryptError> {
        self.password = hash_password(plaintext)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Rename the user; the avatar follows the username
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
        self.avatar = avatar_url(&self.username);
        self.updated_at = Timestamp::now();
    }

    /// Check a candidate password against the stored hash
    pub fn verify_password(&self, candidate: &str) -> bool {
        bcrypt::verify(candidate, &self.password).unwrap_or(false)
    }
}

/// One-way transform of a plaintext secret; salt is generated per call
pub fn hash_password(plaintext: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plaintext, HASH_COST)
}

/// Deterministic avatar URL for a username
pub fn avatar_url(username: &str) -> String {
    format!("{}/{}", AVATAR_HOST, username)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewUser {
        NewUser {
            email: "alice@example.com".to_string(),
            username: "alice42".to_string(),
            password: "secret123".to_string(),
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn test_empty_fields_are_required() {
        let empty = NewUser {
            email: String::new(),
            username: String::new(),
            password: String::new(),
        };
        let err = empty.validate().unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "Email is required",
                "Username is required",
                "Password is required"
            ]
        );
    }

    #[test]
    fn test_malformed_email_rejected() {
        let mut bad = draft();
        bad.email = "not-an-email".to_string();
        let err = bad.validate().unwrap_err();
        assert_eq!(err.messages(), vec!["Please fill a valid email address"]);
    }

    #[test]
    fn test_short_username_rejected() {
        let mut bad = draft();
        bad.username = "ab".to_string();
        let err = bad.validate().unwrap_err();
        assert_eq!(err.messages(), vec!["Username must be at least 3 characters"]);
    }

    #[test]
    fn test_non_alphanumeric_username_rejected() {
        let mut bad = draft();
        bad.username = "alice_42".to_string();
        let err = bad.validate().unwrap_err();
        assert_eq!(
            err.messages(),
            vec!["Username must contain only letters and numbers"]
        );
    }

    #[test]
    fn test_password_is_hashed_and_verifiable() {
        let user = User::from_draft(&draft()).unwrap();
        assert_ne!(user.password, "secret123");
        assert!(user.verify_password("secret123"));
        assert!(!user.verify_password("wrong"));
    }

    #[test]
    fn test_avatar_derived_from_username() {
        let user = User::from_draft(&draft()).unwrap();
        assert_eq!(user.avatar, "https://robohash.org/alice42");
    }

    #[test]
    fn test_set_password_replaces_hash() {
        let mut user = User::from_draft(&draft()).unwrap();
        let old_hash = user.password.clone();
        user.set_password("another456").unwrap();
        assert_ne!(user.password, old_hash);
        assert!(user.verify_password("another456"));
        assert!(!user.verify_password("secret123"));
    }

    #[test]
    fn test_rename_refreshes_avatar() {
        let mut user = User::from_draft(&draft()).unwrap();
        user.set_username("bob7");
        assert_eq!(user.avatar, "https://robohash.org/bob7");
    }
}
