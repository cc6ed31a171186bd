use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A text or file-referencing item attached to a course.
///
/// `text_data` and the `file_*` fields are independent; an item may carry
/// either, both or neither.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: String,
    pub course_id: String,
    pub content_title: String,
    pub text_data: String,
    pub file_name: String,
    pub file_type: String,
    pub file_url: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContentRequest {
    pub id: Option<String>,
    pub content_title: Option<String>,
    pub text_data: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub file_url: Option<String>,
}
