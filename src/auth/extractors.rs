use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::token::{Claims, TokenPurpose};
use crate::error::AppError;

fn claims_from_request(req: &HttpRequest) -> Result<Claims, AppError> {
    req.extensions().get::<Claims>().cloned().ok_or_else(|| {
        // Only reachable if a handler using the extractor was registered
        // outside the AuthMiddleware scope.
        AppError::Unauthorized("no authenticated user in request".to_string())
    })
}

/// Extracts the authenticated user's ID from a verified session token.
///
/// Intended for routes protected by `AuthMiddleware`, which validates the
/// bearer token and inserts the decoded claims into request extensions. A
/// token whose purpose is not `session` (e.g. a password-reset token replayed
/// as a session credential) is rejected with 401.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUserId(pub Uuid);

impl FromRequest for AuthenticatedUserId {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req).and_then(|claims| {
            if claims.purpose == TokenPurpose::Session {
                Ok(AuthenticatedUserId(claims.sub))
            } else {
                Err(AppError::Unauthorized(
                    "token not valid for session access".to_string(),
                ))
            }
        })
        .map_err(Into::into))
    }
}

/// Extracts the user ID from a verified password-reset token.
///
/// The counterpart of [`AuthenticatedUserId`] for the reset flow: only a
/// token issued with the `reset` purpose grants access.
#[derive(Debug, Clone, Copy)]
pub struct ResetUserId(pub Uuid);

impl FromRequest for ResetUserId {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req).and_then(|claims| {
            if claims.purpose == TokenPurpose::Reset {
                Ok(ResetUserId(claims.sub))
            } else {
                Err(AppError::Unauthorized(
                    "token not valid for password reset".to_string(),
                ))
            }
        })
        .map_err(Into::into))
    }
}
