use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::token::{verify_token, Claims};
use crate::error::AppError;

/// Extracts and verifies the bearer token from the `Authorization` header.
///
/// This extractor is used on token-gated routes. It parses the
/// `Authorization: Bearer <token>` header, verifies the JWT, and hands the
/// decoded claims to the handler. Any missing or invalid token is rejected
/// with `AppError::Unauthorized` before the handler body runs.
#[derive(Debug, Clone)]
pub struct BearerClaims(pub Claims);

impl FromRequest for BearerClaims {
    type Error = ActixError; // AppError will be converted into ActixError via ResponseError
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        match bearer {
            Some(token) => match verify_token(token) {
                Ok(claims) => ready(Ok(BearerClaims(claims))),
                Err(app_err) => ready(Err(app_err.into())),
            },
            None => {
                let err = AppError::Unauthorized("Missing token".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
