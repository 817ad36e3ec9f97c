//! User registration and sign-in

use std::sync::Arc;
use tracing::debug;

use workhub_core::core_model::{NewUser, User};
use workhub_core::core_store::{Repository, StoreError, UserStore};

use crate::auth::TokenIssuer;
use crate::error::{ApiError, ApiResult};

/// A successful sign-in: the user plus a signed token
#[derive(Debug)]
pub struct SignedInUser {
    pub token: String,
    pub user: User,
}

/// Registration and authentication flows
pub struct UserService {
    users: Arc<dyn UserStore>,
    tokens: TokenIssuer,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    /// Register a new user
    ///
    /// Store validation failures and duplicate-key conditions become
    /// validation errors; anything else propagates unchanged.
    pub async fn sign_up(&self, draft: NewUser) -> ApiResult<User> {
        match self.users.create(draft) {
            Ok(user) => {
                debug!(user_id = %user.id, "registered user");
                Ok(user)
            }
            Err(StoreError::Validation(errors)) => Err(ApiError::validation(errors)),
            Err(StoreError::Duplicate { detail }) => {
                let (field, message) = if detail.contains("users.email") {
                    ("email", "Email already exists")
                } else if detail.contains("users.username") {
                    ("username", "Username already exists")
                } else {
                    ("user", "A user with same details already exists")
                };
                Err(ApiError::validation_message(field, message))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Verify credentials and issue a token
    ///
    /// Unknown email and wrong password fail identically, so a caller learns
    /// nothing about which part was wrong.
    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<SignedInUser> {
        let user = self
            .users
            .get_by_email(email)?
            .ok_or_else(invalid_credentials)?;

        if !user.verify_password(password) {
            return Err(invalid_credentials());
        }

        let token = self.tokens.issue(&user)?;
        Ok(SignedInUser { token, user })
    }
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid credentials sent from the client", "Invalid credentials")
}
