pub mod content;
pub mod course;

pub use content::{Content, NewContentRequest};
pub use course::{Course, CourseWithContents, NewCourseRequest, UpdateCourseRequest};

use crate::error::AppError;

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Unwraps a required text field, rejecting absent or blank values.
pub(crate) fn required(value: Option<String>, message: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(message.to_string())),
    }
}
