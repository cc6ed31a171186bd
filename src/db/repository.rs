use std::collections::HashMap;

use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};

use crate::error::AppError;
use crate::models::{
    Content, Course, NewContentRequest, NewCourseRequest, UpdateCourseRequest, now_millis,
    required,
};

const COURSE_COLUMNS: &str = "id, title, description, created_at, updated_at";
const CONTENT_COLUMNS: &str =
    "id, course_id, content_title, text_data, file_name, file_type, file_url, created_at";

pub async fn list_courses_descending(db: &SqlitePool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC, rowid DESC"
    ))
    .fetch_all(db)
    .await
}

pub async fn insert_course(db: &SqlitePool, req: NewCourseRequest) -> Result<Course, AppError> {
    let title = required(req.title, "Title required")?;
    let id = required(req.id, "Course ID required")?;
    let now = now_millis();

    let course = Course {
        id,
        title,
        description: req.description.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO courses (id, title, description, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&course.id)
    .bind(&course.title)
    .bind(&course.description)
    .bind(course.created_at)
    .bind(course.updated_at)
    .execute(db)
    .await?;

    Ok(course)
}

/// Returns `false` when no course has the given id.
pub async fn update_course(
    db: &SqlitePool,
    id: &str,
    req: UpdateCourseRequest,
) -> Result<bool, AppError> {
    let title = required(req.title, "Title required")?;
    let description = req.description.unwrap_or_default();

    let result = sqlx::query(
        r#"
        UPDATE courses
        SET title = ?1,
            description = ?2,
            updated_at = ?3
        WHERE id = ?4
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(now_millis())
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

pub async fn delete_course<'e, E>(db: E, id: &'e str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM courses WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_contents_by_course_id<'e, E>(db: E, course_id: &'e str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM contents WHERE course_id = ?1")
        .bind(course_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Deletes a course, then every content item pointing at it, in one
/// transaction. Returns the number of course and content rows removed.
pub async fn delete_course_cascade(db: &SqlitePool, id: &str) -> Result<(u64, u64), sqlx::Error> {
    let mut tx = db.begin().await?;
    let courses = delete_course(&mut *tx, id).await?;
    let contents = delete_contents_by_course_id(&mut *tx, id).await?;
    tx.commit().await?;

    Ok((courses, contents))
}

pub async fn list_contents_for_course(
    db: &SqlitePool,
    course_id: &str,
) -> Result<Vec<Content>, sqlx::Error> {
    sqlx::query_as::<_, Content>(&format!(
        "SELECT {CONTENT_COLUMNS} FROM contents WHERE course_id = ? ORDER BY created_at DESC, rowid DESC"
    ))
    .bind(course_id)
    .fetch_all(db)
    .await
}

/// Fetches the contents of several courses with a single query, grouped by
/// course id. Each group keeps the newest-first order.
pub async fn list_contents_for_courses(
    db: &SqlitePool,
    course_ids: &[String],
) -> Result<HashMap<String, Vec<Content>>, sqlx::Error> {
    if course_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {CONTENT_COLUMNS} FROM contents WHERE course_id IN ("
    ));
    let mut separated = builder.separated(", ");
    for id in course_ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(") ORDER BY created_at DESC, rowid DESC");

    let rows = builder.build_query_as::<Content>().fetch_all(db).await?;

    let mut grouped: HashMap<String, Vec<Content>> = HashMap::new();
    for content in rows {
        grouped.entry(content.course_id.clone()).or_default().push(content);
    }
    Ok(grouped)
}

pub async fn insert_content(
    db: &SqlitePool,
    course_id: &str,
    req: NewContentRequest,
) -> Result<Content, AppError> {
    let content_title = required(req.content_title, "Content title required")?;
    let course_id = required(Some(course_id.to_string()), "Course ID required")?;
    let id = required(req.id, "Content ID required")?;

    let content = Content {
        id,
        course_id,
        content_title,
        text_data: req.text_data.unwrap_or_default(),
        file_name: req.file_name.unwrap_or_default(),
        file_type: req.file_type.unwrap_or_default(),
        file_url: req.file_url.unwrap_or_default(),
        created_at: now_millis(),
    };

    sqlx::query(
        r#"
        INSERT INTO contents
            (id, course_id, content_title, text_data, file_name, file_type, file_url, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&content.id)
    .bind(&content.course_id)
    .bind(&content.content_title)
    .bind(&content.text_data)
    .bind(&content.file_name)
    .bind(&content.file_type)
    .bind(&content.file_url)
    .bind(content.created_at)
    .execute(db)
    .await?;

    Ok(content)
}

pub async fn delete_content_by_id(db: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM contents WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
