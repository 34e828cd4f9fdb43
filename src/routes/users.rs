use crate::{auth::BearerClaims, error::AppError, models::User};
use actix_web::{get, web, HttpResponse, Responder};
use sqlx::PgPool;

/// Who am I
///
/// Returns the user record for the authenticated bearer token.
#[get("/users/me/")]
pub async fn me(
    pool: web::Data<PgPool>,
    claims: BearerClaims,
) -> Result<impl Responder, AppError> {
    let user: Option<User> = sqlx::query_as(
        "SELECT id, email, first_name, last_name, is_active FROM users WHERE email = $1",
    )
    .bind(&claims.0.sub)
    .fetch_optional(&**pool)
    .await?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        // A valid token whose subject no longer exists is still a credential failure.
        None => Err(AppError::Unauthorized(
            "Could not validate credentials".into(),
        )),
    }
}
