use crate::{
    auth::{generate_token, hash_password, verify_password, LoginRequest, RegisterRequest, TokenResponse},
    error::AppError,
    models::User,
};
use actix_web::{post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// Creates a new user account and returns the stored user record.
#[post("/register/")]
pub async fn register(
    pool: web::Data<PgPool>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    register_data.validate()?;

    // Check if email already exists
    let existing_user: Option<i32> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&register_data.email)
        .fetch_optional(&**pool)
        .await?;

    if existing_user.is_some() {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    // Hash password
    let password_hash = hash_password(&register_data.password)?;

    // Insert new user
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, first_name, last_name) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, email, first_name, last_name, is_active",
    )
    .bind(&register_data.email)
    .bind(&password_hash)
    .bind(&register_data.first_name)
    .bind(&register_data.last_name)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(user))
}

/// Login user
///
/// Authenticates a user by email and password and returns a bearer token.
#[post("/token")]
pub async fn login(
    pool: web::Data<PgPool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    login_data.validate()?;

    // Get user credentials from database
    let user: Option<(String, String)> =
        sqlx::query_as("SELECT email, password_hash FROM users WHERE email = $1")
            .bind(&login_data.email)
            .fetch_optional(&**pool)
            .await?;

    match user {
        Some((email, password_hash)) => {
            // Verify password
            if verify_password(&login_data.password, &password_hash)? {
                let token = generate_token(&email)?;
                Ok(HttpResponse::Ok().json(TokenResponse {
                    access_token: token,
                    token_type: "bearer".to_string(),
                }))
            } else {
                Err(AppError::Unauthorized("Incorrect email or password".into()))
            }
        }
        // Same status and message for an unknown email as for a bad password.
        None => Err(AppError::Unauthorized("Incorrect email or password".into())),
    }
}
