use crate::{
    auth::{
        hash_password, has_email_shape, verify_password, AuthResponse, LoginRequest,
        ResetEmailRequest, ResetPasswordRequest, ResetUserId, SignupRequest, TokenKeys,
        TokenPurpose, MIN_PASSWORD_LEN,
    },
    config::Config,
    error::AppError,
    mail::{reset_link, Mailer},
    models::Credential,
};
use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

/// Login
///
/// Authenticates a user by email and password and returns a session token.
/// Unknown account and wrong password produce the same response, so success
/// or failure does not reveal whether an email is registered.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    keys: web::Data<TokenKeys>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let (email, password) = match (&login_data.email, &login_data.password) {
        (Some(email), Some(password)) => (email, password),
        _ => return Err(AppError::Unauthorized("missing credentials".into())),
    };

    let credential = sqlx::query_as::<_, Credential>(
        "SELECT id, password_hash FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(&**pool)
    .await?;

    let credential =
        credential.ok_or_else(|| AppError::Unauthorized("invalid credentials".into()))?;

    if !verify_password(password, &credential.password_hash) {
        return Err(AppError::Unauthorized("invalid credentials".into()));
    }

    let token = keys.issue(credential.id, TokenPurpose::Session)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        expires_in: TokenPurpose::Session.ttl_secs(),
    }))
}

/// Signup
///
/// Creates a new user account. The email check is deliberately minimal
/// ("@" and "." must both be present), matching the public API contract.
#[post("/signup")]
pub async fn signup(
    pool: web::Data<PgPool>,
    signup_data: web::Json<SignupRequest>,
) -> Result<impl Responder, AppError> {
    let data = signup_data.into_inner();
    let (email, password, given_name, last_name) =
        match (data.email, data.password, data.given_name, data.last_name) {
            (Some(email), Some(password), Some(given_name), Some(last_name)) => {
                (email, password, given_name, last_name)
            }
            _ => return Err(AppError::Unauthorized("missing required fields".into())),
        };

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }
    if !has_email_shape(&email) {
        return Err(AppError::BadRequest("invalid email address".into()));
    }

    let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&**pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::BadRequest("user already exists".into()));
    }

    let password_hash = hash_password(&password)?;

    sqlx::query(
        "INSERT INTO users (id, email, password_hash, given_name, last_name)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(&password_hash)
    .bind(&given_name)
    .bind(&last_name)
    .execute(&**pool)
    .await
    .map_err(|e| AppError::BadRequest(format!("could not create user: {}", e)))?;

    Ok(HttpResponse::Created().json(json!({ "message": "user created" })))
}

/// Password-reset request
///
/// Issues a short-lived reset token for a registered email and mails a link
/// embedding it against the configured front-end base URL.
#[post("/email")]
pub async fn request_reset(
    pool: web::Data<PgPool>,
    keys: web::Data<TokenKeys>,
    mailer: web::Data<Mailer>,
    config: web::Data<Config>,
    reset_data: web::Json<ResetEmailRequest>,
) -> Result<impl Responder, AppError> {
    let email = reset_data
        .email
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("missing email".into()))?;

    let user_id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&**pool)
        .await?
        .ok_or_else(|| AppError::NotFound("user is not registered".into()))?;

    let token = keys.issue(user_id, TokenPurpose::Reset)?;
    let link = reset_link(&config.frontend_base_url, &token);

    mailer.send_password_reset(email, &link).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "password reset email sent" })))
}

/// Password reset (apply)
///
/// Protected by the auth gate with a bearer *reset* token; a session token
/// is rejected by the `ResetUserId` extractor. Registered without an
/// attribute macro so the route can be wrapped individually in
/// `routes::config`.
pub async fn reset_password(
    pool: web::Data<PgPool>,
    user: ResetUserId,
    reset_data: web::Json<ResetPasswordRequest>,
) -> Result<impl Responder, AppError> {
    let new_password = reset_data
        .new_password
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("missing new password".into()))?;

    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }

    let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1")
        .bind(user.0)
        .fetch_optional(&**pool)
        .await?;

    if exists.is_none() {
        return Err(AppError::NotFound("user does not exist".into()));
    }

    let password_hash = hash_password(new_password)?;

    sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(user.0)
        .bind(&password_hash)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Created().json(json!({ "message": "password updated" })))
}
