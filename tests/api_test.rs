use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{Value, json};
use sharenotes::admin::AdminCredentials;
use sharenotes::storage::LocalFileStore;
use sharenotes::{AppState, api, db};
use tempfile::TempDir;

struct TestApp {
    server: TestServer,
    uploads: TempDir,
    _static_root: TempDir,
}

async fn spawn_app_with_limit(max_upload_bytes: usize) -> TestApp {
    let pool = db::connect("sqlite::memory:", 1)
        .await
        .expect("Failed to create database");

    let uploads = TempDir::new().expect("Failed to create upload dir");
    let static_root = TempDir::new().expect("Failed to create static dir");
    std::fs::write(static_root.path().join("index.html"), "<h1>notes</h1>")
        .expect("Failed to write index.html");

    let files = LocalFileStore::new(uploads.path(), max_upload_bytes)
        .await
        .expect("Failed to create file store");

    let state = AppState {
        db: pool,
        files: Arc::new(files),
        admin: AdminCredentials::new("admin@gmail.com", "admin123"),
    };

    let server = TestServer::new(api::router(state, static_root.path()))
        .expect("Failed to create test server");

    TestApp {
        server,
        uploads,
        _static_root: static_root,
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with_limit(256 * 1024 * 1024).await
}

async fn list_courses(server: &TestServer) -> Vec<Value> {
    let response = server.get("/api/courses").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<Vec<Value>>()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = spawn_app().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_course_echoes_record() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/courses")
        .json(&json!({ "id": "c1", "title": "Physics", "description": "Mechanics" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body = response.json::<Value>();
    assert_eq!(body["id"], "c1");
    assert_eq!(body["title"], "Physics");
    assert_eq!(body["description"], "Mechanics");
    assert!(body["createdAt"].is_i64());
    assert_eq!(body["contents"], json!([]));
}

#[tokio::test]
async fn test_create_course_without_title_is_rejected() {
    let app = spawn_app().await;

    for body in [json!({ "id": "c1", "title": "" }), json!({ "id": "c1" })] {
        let response = app.server.post("/api/courses").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Title required");
    }

    assert!(list_courses(&app.server).await.is_empty());
}

#[tokio::test]
async fn test_duplicate_course_id_persists_once() {
    let app = spawn_app().await;

    let first = app
        .server
        .post("/api/courses")
        .json(&json!({ "id": "c1", "title": "First" }))
        .await;
    assert_eq!(first.status_code(), StatusCode::OK);

    let second = app
        .server
        .post("/api/courses")
        .json(&json!({ "id": "c1", "title": "Second" }))
        .await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);

    let courses = list_courses(&app.server).await;
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["title"], "First");
}

#[tokio::test]
async fn test_courses_listed_newest_first_with_contents() {
    let app = spawn_app().await;

    for id in ["a", "b", "c"] {
        app.server
            .post("/api/courses")
            .json(&json!({ "id": id, "title": id.to_uppercase() }))
            .await
            .assert_status_ok();
    }

    for (id, title) in [("n1", "Week 1"), ("n2", "Week 2")] {
        app.server
            .post("/api/courses/b/contents")
            .json(&json!({ "id": id, "contentTitle": title, "textData": "notes" }))
            .await
            .assert_status_ok();
    }

    let courses = list_courses(&app.server).await;
    let ids: Vec<&str> = courses.iter().map(|c| c["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["c", "b", "a"]);

    let contents = courses[1]["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 2);
    assert_eq!(contents[0]["id"], "n2");
    assert_eq!(contents[0]["courseId"], "b");
    assert_eq!(contents[0]["textData"], "notes");
    assert_eq!(contents[0]["fileUrl"], "");
    assert_eq!(courses[0]["contents"], json!([]));
}

#[tokio::test]
async fn test_update_course() {
    let app = spawn_app().await;
    app.server
        .post("/api/courses")
        .json(&json!({ "id": "c1", "title": "Old" }))
        .await
        .assert_status_ok();

    let response = app
        .server
        .put("/api/courses/c1")
        .json(&json!({ "title": "New", "description": "Fresh" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["success"], true);

    let courses = list_courses(&app.server).await;
    assert_eq!(courses[0]["title"], "New");
    assert_eq!(courses[0]["description"], "Fresh");

    let response = app
        .server
        .put("/api/courses/c1")
        .json(&json!({ "description": "no title" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .server
        .put("/api/courses/missing")
        .json(&json!({ "title": "Ghost" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_course_removes_contents() {
    let app = spawn_app().await;

    for id in ["c1", "c2"] {
        app.server
            .post("/api/courses")
            .json(&json!({ "id": id, "title": id }))
            .await
            .assert_status_ok();
    }
    app.server
        .post("/api/courses/c1/contents")
        .json(&json!({ "id": "n1", "contentTitle": "Gone" }))
        .await
        .assert_status_ok();
    app.server
        .post("/api/courses/c2/contents")
        .json(&json!({ "id": "n2", "contentTitle": "Stays" }))
        .await
        .assert_status_ok();

    let response = app.server.delete("/api/courses/c1").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["message"], "Course deleted");

    let courses = list_courses(&app.server).await;
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["id"], "c2");
    assert_eq!(courses[0]["contents"].as_array().unwrap().len(), 1);

    // Re-creating the id must not resurrect the old contents.
    app.server
        .post("/api/courses")
        .json(&json!({ "id": "c1", "title": "Again" }))
        .await
        .assert_status_ok();
    let courses = list_courses(&app.server).await;
    assert_eq!(courses[0]["id"], "c1");
    assert_eq!(courses[0]["contents"], json!([]));
}

#[tokio::test]
async fn test_add_content_requires_fields() {
    let app = spawn_app().await;

    let cases = [
        (json!({ "contentTitle": "No id" }), "Content ID required"),
        (json!({ "id": "n1" }), "Content title required"),
        (json!({ "id": "n1", "contentTitle": "" }), "Content title required"),
    ];

    for (body, message) in cases {
        let response = app.server.post("/api/courses/c1/contents").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], message);
    }

    app.server
        .post("/api/courses")
        .json(&json!({ "id": "c1", "title": "Course" }))
        .await
        .assert_status_ok();
    let courses = list_courses(&app.server).await;
    assert_eq!(courses[0]["contents"], json!([]));
}

#[tokio::test]
async fn test_delete_content() {
    let app = spawn_app().await;
    app.server
        .post("/api/courses")
        .json(&json!({ "id": "c1", "title": "Course" }))
        .await
        .assert_status_ok();
    app.server
        .post("/api/courses/c1/contents")
        .json(&json!({ "id": "n1", "contentTitle": "Note" }))
        .await
        .assert_status_ok();

    let response = app.server.delete("/api/courses/c1/contents/n1").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["success"], true);

    let courses = list_courses(&app.server).await;
    assert_eq!(courses[0]["contents"], json!([]));
}

#[tokio::test]
async fn test_upload_round_trip() {
    let app = spawn_app().await;
    let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(payload.clone())
            .file_name("lecture.pdf")
            .mime_type("application/pdf"),
    );
    let response = app.server.post("/api/upload").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body = response.json::<Value>();
    assert_eq!(body["fileName"], "lecture.pdf");
    assert_eq!(body["fileType"], "application/pdf");
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with(".pdf"));

    let download = app.server.get(&url).await;
    assert_eq!(download.status_code(), StatusCode::OK);
    assert_eq!(&download.as_bytes()[..], payload.as_slice());
    assert_eq!(download.header("content-type"), "application/pdf");
    assert_eq!(download.header("content-length"), "4096");
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let app = spawn_app().await;

    let form = MultipartForm::new().add_text("note", "no file here");
    let response = app.server.post("/api/upload").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "No file uploaded");
}

#[tokio::test]
async fn test_upload_file_part_without_filename_is_skipped() {
    let app = spawn_app().await;

    let form = MultipartForm::new().add_text("file", "plain text, not a file");
    let response = app.server.post("/api/upload").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "No file uploaded");
    assert!(std::fs::read_dir(app.uploads.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_upload_over_limit() {
    let app = spawn_app_with_limit(16).await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![7u8; 64]).file_name("big.bin"),
    );
    let response = app.server.post("/api/upload").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.json::<Value>()["error"], "File too large");

    // The rejected stream must not leave a partial file behind.
    assert!(std::fs::read_dir(app.uploads.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_unknown_upload_is_not_found() {
    let app = spawn_app().await;
    let response = app.server.get("/uploads/1700000000000-1.txt").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_url() {
    let app = spawn_app().await;
    let response = app.server.get("/api/upload-url").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({ "uploadUrl": "/api/upload" }));
}

#[tokio::test]
async fn test_admin_login() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/admin/login")
        .json(&json!({ "email": "admin@gmail.com", "password": "admin123" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["success"], true);

    for body in [
        json!({ "email": "admin@gmail.com", "password": "wrong" }),
        json!({ "email": "someone@gmail.com", "password": "admin123" }),
        json!({}),
    ] {
        let response = app.server.post("/api/admin/login").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["success"], false);
    }
}

#[tokio::test]
async fn test_admin_login_with_form_body() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/admin/login")
        .form(&[("email", "admin@gmail.com"), ("password", "admin123")])
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["success"], true);

    let response = app
        .server
        .post("/api/admin/login")
        .form(&[("email", "admin@gmail.com"), ("password", "nope")])
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_login_with_unreadable_body() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/admin/login")
        .json(&json!({ "email": 1, "password": "admin123" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["success"], false);

    let response = app
        .server
        .post("/api/admin/login")
        .text("email=admin@gmail.com&password=admin123")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["success"], false);
}

#[tokio::test]
async fn test_malformed_bodies_use_error_contract() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/courses")
        .json(&json!({ "id": "c1", "title": 7 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());

    let response = app
        .server
        .post("/api/courses")
        .text(r#"{"id":"c1","title":"Physics"}"#)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());

    app.server
        .post("/api/courses")
        .json(&json!({ "id": "c1", "title": "Physics" }))
        .await
        .assert_status_ok();
    let response = app
        .server
        .post("/api/courses/c1/contents")
        .json(&json!({ "id": "t1", "contentTitle": "Notes", "textData": 3 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());

    assert_eq!(list_courses(&app.server).await[0]["contents"], json!([]));
}

#[tokio::test]
async fn test_create_course_with_form_body() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/courses")
        .form(&[("id", "c1"), ("title", "Chemistry"), ("description", "Organic")])
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["title"], "Chemistry");

    let courses = list_courses(&app.server).await;
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["description"], "Organic");
}

#[tokio::test]
async fn test_static_root_is_served() {
    let app = spawn_app().await;

    let response = app.server.get("/index.html").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "<h1>notes</h1>");

    let response = app.server.get("/missing.html").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
