mod extract;

use axum::extract::Path;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::{Json, Router, extract::State, routing::get};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::AppError;
use crate::models::Course;
use crate::state::AppState;
use crate::validation;

pub use extract::CourseBody;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Ids that are not integers cannot name a stored course.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = state.courses.list_all().await?;
    Ok(Json(courses))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Course>, AppError> {
    let id = parse_id(&id).ok_or(AppError::NotFound)?;
    let course = state
        .courses
        .get_by_id(id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(course))
}

async fn create_course(
    State(state): State<AppState>,
    CourseBody(req): CourseBody,
) -> Result<impl IntoResponse, AppError> {
    let course = validation::validate(req).map_err(AppError::Validation)?;
    let course = state.courses.insert(course).await?;
    let location = format!("/courses/{}", course.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(course)))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    CourseBody(req): CourseBody,
) -> Result<StatusCode, AppError> {
    let course = validation::validate(req).map_err(AppError::Validation)?;
    let id = parse_id(&id).ok_or(AppError::NotFound)?;
    state
        .courses
        .update_by_id(id, course)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    match parse_id(&id) {
        Some(id) => state.courses.soft_delete_by_id(id).await?,
        None => debug!("ignoring delete of non-numeric id {:?}", id),
    }
    Ok(StatusCode::NO_CONTENT)
}
