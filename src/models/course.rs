use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Content;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A course as returned by the listing endpoint, with its contents inlined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseWithContents {
    #[serde(flatten)]
    pub course: Course,
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCourseRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}
