mod extract;
mod uploads;

pub use extract::Payload;

use std::path::Path;

use axum::Json;
use axum::extract::{DefaultBodyLimit, Path as UrlPath};
use axum::routing::{delete, post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

const JSON_BODY_LIMIT: usize = 50 * 1024 * 1024;
// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Outcome body shared by the mutation endpoints and admin login.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    fn ok(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

/// Builds the HTTP surface. Anything not matched by an API route is served
/// from `static_dir`.
pub fn router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let upload_limit = state
        .files
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/health", get(health))
        .route("/api/courses", get(list_courses).post(create_course))
        .route("/api/courses/{id}", put(update_course).delete(delete_course))
        .route("/api/courses/{course_id}/contents", post(add_content))
        .route(
            "/api/courses/{course_id}/contents/{content_id}",
            delete(delete_content),
        )
        .route(
            "/api/upload",
            post(uploads::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/upload-url", get(uploads::upload_url))
        .route("/uploads/{file_name}", get(uploads::serve_upload))
        .route("/api/admin/login", post(admin_login))
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseWithContents>>, AppError> {
    let courses = repository::list_courses_descending(&state.db).await?;
    let ids: Vec<String> = courses.iter().map(|c| c.id.clone()).collect();
    let mut contents = repository::list_contents_for_courses(&state.db, &ids).await?;

    let courses = courses
        .into_iter()
        .map(|course| {
            let contents = contents.remove(&course.id).unwrap_or_default();
            CourseWithContents { course, contents }
        })
        .collect();

    Ok(Json(courses))
}

async fn create_course(
    State(state): State<AppState>,
    Payload(req): Payload<NewCourseRequest>,
) -> Result<Json<CourseWithContents>, AppError> {
    let course = repository::insert_course(&state.db, req).await?;
    info!("course created: {}", course.id);
    Ok(Json(CourseWithContents {
        course,
        contents: Vec::new(),
    }))
}

async fn update_course(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
    Payload(req): Payload<UpdateCourseRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    if !repository::update_course(&state.db, &id, req).await? {
        return Err(AppError::NotFound);
    }
    Ok(ActionResponse::ok("Course updated"))
}

async fn delete_course(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<ActionResponse>, AppError> {
    let (courses, contents) = repository::delete_course_cascade(&state.db, &id).await?;
    info!("course {} deleted ({} rows, {} contents)", id, courses, contents);
    Ok(ActionResponse::ok("Course deleted"))
}

async fn add_content(
    State(state): State<AppState>,
    UrlPath(course_id): UrlPath<String>,
    Payload(req): Payload<NewContentRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let content = repository::insert_content(&state.db, &course_id, req).await?;
    info!("content {} added to course {}", content.id, content.course_id);
    Ok(ActionResponse::ok("Content added"))
}

async fn delete_content(
    State(state): State<AppState>,
    UrlPath((_course_id, content_id)): UrlPath<(String, String)>,
) -> Result<Json<ActionResponse>, AppError> {
    repository::delete_content_by_id(&state.db, &content_id).await?;
    Ok(ActionResponse::ok("Content deleted"))
}

async fn admin_login(
    State(state): State<AppState>,
    body: Result<Payload<LoginRequest>, AppError>,
) -> (StatusCode, Json<ActionResponse>) {
    // An unreadable body is just another wrong credential pair.
    let (email, password) = match body {
        Ok(Payload(req)) => (req.email.unwrap_or_default(), req.password.unwrap_or_default()),
        Err(_) => (String::new(), String::new()),
    };

    if state.admin.check(&email, &password) {
        info!("admin login succeeded");
        (StatusCode::OK, ActionResponse::ok("Login successful"))
    } else {
        warn!("admin login rejected");
        (
            StatusCode::UNAUTHORIZED,
            Json(ActionResponse {
                success: false,
                message: "Invalid credentials".to_string(),
            }),
        )
    }
}
