use crate::{
    auth::{
        has_email_shape, hash_password, verify_password, AuthenticatedUserId,
        ChangePasswordRequest, MIN_PASSWORD_LEN,
    },
    error::AppError,
    models::{Credential, UserProfile, UserSettingsUpdate},
};
use actix_web::{get, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const PROFILE_COLUMNS: &str = "id, email, given_name, last_name, image, created_at, updated_at";

/// Returns the authenticated user's own profile.
#[get("/userinfo")]
pub async fn userinfo(
    pool: web::Data<PgPool>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let profile = sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        PROFILE_COLUMNS
    ))
    .bind(user.0)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("user does not exist".into()))?;

    Ok(HttpResponse::Ok().json(profile))
}

/// Changes the authenticated user's password after re-checking the current one.
#[put("/changePassword")]
pub async fn change_password(
    pool: web::Data<PgPool>,
    user: AuthenticatedUserId,
    change_data: web::Json<ChangePasswordRequest>,
) -> Result<impl Responder, AppError> {
    let (current_password, new_password) =
        match (&change_data.current_password, &change_data.new_password) {
            (Some(current), Some(new)) => (current, new),
            _ => return Err(AppError::BadRequest("missing password fields".into())),
        };

    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }

    let credential =
        sqlx::query_as::<_, Credential>("SELECT id, password_hash FROM users WHERE id = $1")
            .bind(user.0)
            .fetch_optional(&**pool)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid credentials".into()))?;

    if !verify_password(current_password, &credential.password_hash) {
        return Err(AppError::Unauthorized("invalid credentials".into()));
    }

    let password_hash = hash_password(new_password)?;

    sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(user.0)
        .bind(&password_hash)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Created().json(json!({ "message": "password changed" })))
}

/// Updates the authenticated user's profile settings.
///
/// Only the allow-listed fields in [`UserSettingsUpdate`] are writable;
/// omitted fields keep their stored values. The path id must belong to the
/// caller; other users' records answer 404.
#[put("/settings/{id}")]
pub async fn update_settings(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    user: AuthenticatedUserId,
    settings: web::Json<UserSettingsUpdate>,
) -> Result<impl Responder, AppError> {
    settings.validate()?;
    let target_id = path.into_inner();

    if target_id != user.0 {
        return Err(AppError::NotFound("user does not exist".into()));
    }

    if let Some(email) = &settings.email {
        if !has_email_shape(email) {
            return Err(AppError::BadRequest("invalid email address".into()));
        }
    }

    let updated = sqlx::query_as::<_, UserProfile>(&format!(
        "UPDATE users
         SET email = COALESCE($2, email),
             given_name = COALESCE($3, given_name),
             last_name = COALESCE($4, last_name),
             image = COALESCE($5, image),
             updated_at = now()
         WHERE id = $1
         RETURNING {}",
        PROFILE_COLUMNS
    ))
    .bind(target_id)
    .bind(&settings.email)
    .bind(&settings.given_name)
    .bind(&settings.last_name)
    .bind(&settings.image)
    .fetch_optional(&**pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::NotFound("user does not exist".into()),
        // Includes the unique-email violation when changing the address.
        e => AppError::BadRequest(format!("could not update user: {}", e)),
    })?
    .ok_or_else(|| AppError::NotFound("user does not exist".into()))?;

    Ok(HttpResponse::Created().json(updated))
}

/// Fetches any user's public profile by id (password hash never serialized).
#[get("/{id}")]
pub async fn get_user(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    _user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let profile = sqlx::query_as::<_, UserProfile>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        PROFILE_COLUMNS
    ))
    .bind(path.into_inner())
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("user does not exist".into()))?;

    Ok(HttpResponse::Ok().json(profile))
}
