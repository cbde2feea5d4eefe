use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{TagQuery, Task, TaskInput, TaskOrder, TaskUpdate},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const TASK_COLUMNS: &str =
    "id, name, description, end_date, priority, status, tag, user_id, created_at, updated_at";

/// Maps a `UNIQUE (user_id, name)` violation to the duplicate-name 400.
///
/// The check-then-insert sequence is not transactional, so a concurrent
/// request can slip past [`name_taken`] and trip the index instead; that
/// loser gets the same response as the non-racy duplicate.
fn map_duplicate_name(e: sqlx::Error) -> AppError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            AppError::BadRequest("you already have a task with that name".into())
        }
        _ => e.into(),
    }
}

async fn name_taken(pool: &PgPool, user_id: Uuid, name: &str) -> Result<bool, AppError> {
    let existing = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM tasks WHERE user_id = $1 AND name = $2",
    )
    .bind(user_id)
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(existing.is_some())
}

/// Creates a new task owned by the authenticated user.
///
/// The name must be unused among the caller's own tasks and the due date
/// strictly in the future. Omitted priority/status/tag fall back to
/// low/pending/none.
///
/// ## Responses:
/// - `201 Created`: the created `Task` as JSON.
/// - `400 Bad Request`: duplicate name, past due date, or invalid payload.
/// - `401 Unauthorized` / `403 Forbidden`: from the auth gate.
#[post("/newTask")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUserId,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let input = task_data.into_inner();

    if name_taken(&pool, user.0, &input.name).await? {
        return Err(AppError::BadRequest(
            "you already have a task with that name".into(),
        ));
    }

    if input.end_date <= Utc::now() {
        return Err(AppError::BadRequest("end date must be in the future".into()));
    }

    let task = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (id, name, description, end_date, priority, status, tag, user_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.end_date)
    .bind(input.priority)
    .bind(input.status)
    .bind(input.tag)
    .bind(user.0)
    .fetch_one(&**pool)
    .await
    .map_err(map_duplicate_name)?;

    Ok(HttpResponse::Created().json(task))
}

/// Lists all tasks owned by the authenticated user, newest first.
///
/// An empty result set answers 404 rather than an empty list; that is the
/// documented API contract.
#[get("/showTasks")]
pub async fn list_tasks(
    pool: web::Data<PgPool>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY created_at DESC",
        TASK_COLUMNS
    ))
    .bind(user.0)
    .fetch_all(&**pool)
    .await?;

    if tasks.is_empty() {
        return Err(AppError::NotFound("no tasks".into()));
    }

    Ok(HttpResponse::Ok().json(tasks))
}

/// Searches the caller's tasks by tag.
///
/// `value` is matched case-insensitively as a substring of the tag
/// ("mon" finds tasks tagged "money"); an absent `value` matches everything.
/// `status` optionally sorts the result as `column-direction` against a
/// whitelist of sortable columns.
#[get("/tags")]
pub async fn search_tags(
    pool: web::Data<PgPool>,
    user: AuthenticatedUserId,
    query: web::Query<TagQuery>,
) -> Result<impl Responder, AppError> {
    let pattern = format!(
        "%{}%",
        query
            .value
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_lowercase()
    );

    let order_sql = match query.status.as_deref() {
        Some(raw) => TaskOrder::parse(raw)
            .ok_or_else(|| AppError::BadRequest("invalid sort parameter".into()))?
            .to_sql(),
        None => String::new(),
    };

    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE user_id = $1 AND tag::text ILIKE $2{}",
        TASK_COLUMNS, order_sql
    ))
    .bind(user.0)
    .bind(&pattern)
    .fetch_all(&**pool)
    .await?;

    if tasks.is_empty() {
        return Err(AppError::NotFound(
            "no tasks match the search filter".into(),
        ));
    }

    Ok(HttpResponse::Ok().json(tasks))
}

/// Retrieves one of the caller's tasks by id.
///
/// Lookups are owner-scoped: another user's task id answers 404, same as a
/// nonexistent one.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
        TASK_COLUMNS
    ))
    .bind(task_id.into_inner())
    .bind(user.0)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}

/// Updates one of the caller's tasks.
///
/// Only the allow-listed fields in [`TaskUpdate`] are writable; omitted
/// fields keep their stored values. Renaming onto a name the caller already
/// uses is rejected.
///
/// ## Responses:
/// - `201 Created`: the merged `Task` as JSON.
/// - `400 Bad Request`: duplicate name or invalid payload.
/// - `404 Not Found`: no such task owned by the caller.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUserId,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task_uuid = task_id.into_inner();
    let update = task_data.into_inner();

    let existing = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
        TASK_COLUMNS
    ))
    .bind(task_uuid)
    .bind(user.0)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("task not found".into()))?;

    if let Some(name) = &update.name {
        if *name != existing.name && name_taken(&pool, user.0, name).await? {
            return Err(AppError::BadRequest(
                "you already have a task with that name".into(),
            ));
        }
    }

    let updated = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks
         SET name = COALESCE($3, name),
             description = COALESCE($4, description),
             end_date = COALESCE($5, end_date),
             priority = COALESCE($6, priority),
             status = COALESCE($7, status),
             tag = COALESCE($8, tag),
             updated_at = now()
         WHERE id = $1 AND user_id = $2
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(task_uuid)
    .bind(user.0)
    .bind(&update.name)
    .bind(&update.description)
    .bind(update.end_date)
    .bind(update.priority)
    .bind(update.status)
    .bind(update.tag)
    .fetch_one(&**pool)
    .await
    .map_err(map_duplicate_name)?;

    Ok(HttpResponse::Created().json(updated))
}

/// Hard-deletes one of the caller's tasks.
///
/// Responds 200 with a confirmation message carrying the task name.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let task_uuid = task_id.into_inner();

    let name = sqlx::query_scalar::<_, String>(
        "SELECT name FROM tasks WHERE id = $1 AND user_id = $2",
    )
    .bind(task_uuid)
    .bind(user.0)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("task not found".into()))?;

    sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
        .bind(task_uuid)
        .bind(user.0)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("deleted task: {}", name)
    })))
}
