pub mod extractors;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use extractors::BearerClaims;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// User's password.
    /// Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address for the new account.
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// Password for the new account.
    /// Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
    /// Given name for the new account.
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    /// Family name for the new account.
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
}

/// Response structure after a successful login.
///
/// Mirrors the OAuth2 bearer-token shape consumed by the frontend.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The JWT (JSON Web Token) for session authentication.
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
}

#[cfg(test)]
pub(crate) mod test_env {
    use std::sync::Mutex;

    // Tests that read or write JWT_SECRET serialize on this lock; the
    // process environment is shared across test threads.
    pub(crate) static JWT_ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Runs test logic with a temporarily set JWT_SECRET, restoring the
    /// previous value afterwards even if the logic panics.
    pub(crate) fn run_with_temp_jwt_secret<F>(secret_value: &str, test_logic: F)
    where
        F: FnOnce(),
    {
        let _guard = JWT_ENV_LOCK.lock().unwrap(); // Released when _guard goes out of scope

        let original_secret_val = std::env::var("JWT_SECRET").ok();
        std::env::set_var("JWT_SECRET", secret_value);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test_logic));

        if let Some(original) = original_secret_val {
            std::env::set_var("JWT_SECRET", original);
        } else {
            std::env::remove_var("JWT_SECRET");
        }

        if let Err(panic_payload) = result {
            std::panic::resume_unwind(panic_payload);
        }
    }
}
