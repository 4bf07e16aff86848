use axum::{
    Router,
    extract::{Multipart, Path as AxumPath, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::application::use_cases::uploads::UploadError;
use crate::application::use_cases::uploads::upload_form_file::UploadFormFile;
use crate::application::use_cases::uploads::upload_named_file::UploadNamedFile;
use crate::bootstrap::app_context::AppContext;
use crate::domain::uploads::StoredName;
use crate::presentation::http::error::{ApiError, ErrorBody};
use crate::presentation::http::flash;
use crate::presentation::http::multipart::read_file_field;

const FILE_RECEIVED: &str = "file received";
const FILE_UPLOAD_STATUS: &str = "file_upload run";

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(upload_form).post(upload_file))
        .route("/file_upload", get(file_upload_status).post(file_upload))
        .route(
            "/recognition/:image",
            post(recognition_upload).get(recognition_not_found),
        )
        .with_state(ctx)
}

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct FileMultipart {
    /// File to upload
    #[schema(value_type = String, format = Binary)]
    file: String,
}

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImageMultipart {
    /// Image to store under the name given in the path
    #[schema(value_type = String, format = Binary)]
    image: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadFormQuery {
    /// Name of the file stored by the previous upload
    pub name: Option<String>,
}

/// GET / -> upload form, plus any pending flash message and upload confirmation
#[utoipa::path(
    get,
    path = "/",
    tag = "Uploads",
    params(UploadFormQuery),
    responses((status = 200, description = "Upload form", body = String, content_type = "text/html"))
)]
pub async fn upload_form(Query(q): Query<UploadFormQuery>, headers: HeaderMap) -> Response {
    let pending = flash::peek(&headers);
    let page = render_form(pending.as_deref(), q.name.as_deref());
    let mut response = Html(page).into_response();
    if pending.is_some() {
        response
            .headers_mut()
            .append(header::SET_COOKIE, flash::clear_cookie());
    }
    response
}

/// POST / (multipart/form-data)
/// Fields:
/// - file: binary file with an allowed extension (required)
#[utoipa::path(
    post,
    path = "/",
    tag = "Uploads",
    request_body(content = FileMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 303, description = "Stored; redirects to /?name=<filename>, or back to / with a flash message when rejected"),
        (status = 413, description = "File too large", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    )
)]
pub async fn upload_file(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let incoming = read_file_field(&mut multipart, "file", ctx.cfg.upload_max_bytes).await?;

    let storage = ctx.storage_port();
    let uc = UploadFormFile {
        storage: storage.as_ref(),
        allowed: &ctx.cfg.allowed_extensions,
    };
    match uc.execute(incoming).await {
        Ok(stored) => {
            let location = format!("/?name={}", urlencoding::encode(stored.name.as_str()));
            Ok(Redirect::to(&location).into_response())
        }
        Err(err) if err.is_client_error() => {
            tracing::warn!(error = ?err, "upload_rejected");
            Ok(flash::redirect_with("/", &err.to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

#[utoipa::path(
    get,
    path = "/file_upload",
    tag = "Uploads",
    responses((status = 200, description = "Endpoint status", body = String, content_type = "text/plain"))
)]
pub async fn file_upload_status() -> &'static str {
    FILE_UPLOAD_STATUS
}

/// POST /file_upload (multipart/form-data)
/// Stores field `file` under the configured fixed name, replacing the previous upload.
#[utoipa::path(
    post,
    path = "/file_upload",
    tag = "Uploads",
    request_body(content = FileMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Stored", body = String, content_type = "text/plain"),
        (status = 400, description = "No file part", body = ErrorBody),
        (status = 413, description = "File too large", body = ErrorBody)
    )
)]
pub async fn file_upload(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<&'static str, ApiError> {
    let incoming = read_file_field(&mut multipart, "file", ctx.cfg.upload_max_bytes).await?;
    let storage = ctx.storage_port();
    let uc = UploadNamedFile {
        storage: storage.as_ref(),
    };
    uc.execute(&ctx.cfg.fixed_upload_name, incoming).await?;
    Ok(FILE_RECEIVED)
}

/// POST /recognition/{image} (multipart/form-data)
/// Stores field `image` as `{image}` inside the storage root.
#[utoipa::path(
    post,
    path = "/recognition/{image}",
    tag = "Uploads",
    params(("image" = String, Path, description = "Target file name, a single path component")),
    request_body(content = ImageMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Stored", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid target name or no image part", body = ErrorBody),
        (status = 413, description = "File too large", body = ErrorBody)
    )
)]
pub async fn recognition_upload(
    State(ctx): State<AppContext>,
    AxumPath(image): AxumPath<String>,
    mut multipart: Multipart,
) -> Result<&'static str, ApiError> {
    let target = StoredName::from_segment(&image).map_err(UploadError::InvalidFilename)?;
    let incoming = read_file_field(&mut multipart, "image", ctx.cfg.upload_max_bytes).await?;
    let storage = ctx.storage_port();
    let uc = UploadNamedFile {
        storage: storage.as_ref(),
    };
    uc.execute(&target, incoming).await?;
    Ok(FILE_RECEIVED)
}

#[utoipa::path(
    get,
    path = "/recognition/{image}",
    tag = "Uploads",
    params(("image" = String, Path, description = "Target file name")),
    responses((status = 404, description = "Stored images are not served"))
)]
pub async fn recognition_not_found(AxumPath(_image): AxumPath<String>) -> StatusCode {
    StatusCode::NOT_FOUND
}

fn render_form(flash_message: Option<&str>, stored_name: Option<&str>) -> String {
    let mut page = String::from(
        "<!doctype html>\n<title>Upload new File</title>\n<h1>Upload new File</h1>\n",
    );
    if let Some(message) = flash_message {
        page.push_str(&format!(
            "<ul class=flashes>\n  <li>{}</li>\n</ul>\n",
            htmlescape::encode_minimal(message)
        ));
    }
    if let Some(name) = stored_name.filter(|n| !n.is_empty()) {
        page.push_str(&format!(
            "<p class=uploaded>Uploaded <code>{}</code></p>\n",
            htmlescape::encode_minimal(name)
        ));
    }
    page.push_str(
        "<form method=post enctype=multipart/form-data>\n  <input type=file name=file>\n  <input type=submit value=Upload>\n</form>\n",
    );
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::app_context::AppServices;
    use crate::bootstrap::config::Config;
    use crate::infrastructure::storage::FsStoragePort;
    use crate::presentation::http::router;
    use axum::http::HeaderValue;
    use axum_test::TestServer;
    use axum_test::multipart::{MultipartForm, Part};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Harness {
        _temp: TempDir,
        outer: PathBuf,
        root: PathBuf,
        server: TestServer,
    }

    fn harness() -> Harness {
        let temp = TempDir::new().unwrap();
        let outer = temp.path().to_path_buf();
        let root = outer.join("images");
        let root_str = root.display().to_string();
        let cfg = Config::from_lookup(|key| match key {
            "STORAGE_ROOT" => Some(root_str.clone()),
            "UPLOAD_MAX_BYTES" => Some("1024".into()),
            _ => None,
        })
        .unwrap();
        let storage = Arc::new(FsStoragePort::new(&cfg.storage_root).unwrap());
        let ctx = AppContext::new(cfg, AppServices::new(storage));
        let server = TestServer::new(router(ctx)).unwrap();
        Harness {
            _temp: temp,
            outer,
            root,
            server,
        }
    }

    fn file_form(field: &str, filename: &str, bytes: &[u8]) -> MultipartForm {
        MultipartForm::new().add_part(field, Part::bytes(bytes.to_vec()).file_name(filename))
    }

    fn stored_files(root: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn form_upload_stores_and_redirects_to_confirmation() {
        let h = harness();
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

        let response = h
            .server
            .post("/")
            .multipart(file_form("file", "photo.png", png))
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/?name=photo.png");
        assert_eq!(std::fs::read(h.root.join("photo.png")).unwrap(), png);
    }

    #[tokio::test]
    async fn form_upload_sanitizes_client_filename() {
        let h = harness();

        let response = h
            .server
            .post("/")
            .multipart(file_form("file", "my holiday.jpg", b"jpg"))
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/?name=my_holiday.jpg");
        assert_eq!(stored_files(&h.root), vec!["my_holiday.jpg"]);
    }

    #[tokio::test]
    async fn form_upload_rejects_disallowed_extension() {
        let h = harness();

        let response = h
            .server
            .post("/")
            .multipart(file_form("file", "notes.exe", b"x"))
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/");
        let cookie = response.header("set-cookie");
        assert!(cookie.to_str().unwrap().contains("not%20allowed"));
        assert!(stored_files(&h.root).is_empty());
    }

    #[tokio::test]
    async fn form_upload_rejects_name_without_extension() {
        let h = harness();

        let response = h
            .server
            .post("/")
            .multipart(file_form("file", "README", b"x"))
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/");
        assert!(stored_files(&h.root).is_empty());
    }

    #[tokio::test]
    async fn form_upload_without_file_part_flashes() {
        let h = harness();

        let response = h
            .server
            .post("/")
            .multipart(MultipartForm::new().add_text("file", "not a file"))
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/");
        let cookie = response.header("set-cookie");
        assert!(cookie.to_str().unwrap().contains("No%20file%20part"));
    }

    #[tokio::test]
    async fn form_upload_with_empty_filename_flashes() {
        let h = harness();

        let response = h
            .server
            .post("/")
            .multipart(file_form("file", "", b"x"))
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/");
        let cookie = response.header("set-cookie");
        assert!(cookie.to_str().unwrap().contains("No%20selected%20file"));
        assert!(stored_files(&h.root).is_empty());
    }

    #[tokio::test]
    async fn form_upload_flash_stays_short_for_long_filenames() {
        let h = harness();
        let filename = format!("{}.exe", "x".repeat(5000));

        let response = h
            .server
            .post("/")
            .multipart(file_form("file", &filename, b"x"))
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        let cookie = response.header("set-cookie");
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("imgdrop_flash=File%20type%20not%20allowed;"));
        assert!(cookie.len() < 4096);
    }

    #[tokio::test]
    async fn malformed_multipart_body_is_rejected() {
        let h = harness();
        // The closing boundary never arrives.
        let body = "--XBOUNDARY\r\n\
                    Content-Disposition: form-data; name=\"file\"; filename=\"a.jpg\"\r\n\
                    \r\n\
                    abc";

        let response = h
            .server
            .post("/file_upload")
            .bytes(axum::body::Bytes::from_static(body.as_bytes()))
            .content_type("multipart/form-data; boundary=XBOUNDARY")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let json = response.json::<serde_json::Value>();
        assert_eq!(json["error"], "INVALID_MULTIPART");
        assert!(stored_files(&h.root).is_empty());
    }

    #[tokio::test]
    async fn form_page_renders_and_clears_flash() {
        let h = harness();

        let response = h
            .server
            .get("/")
            .add_header(
                header::COOKIE,
                HeaderValue::from_static("imgdrop_flash=File%20type%20not%20allowed%3A%20%3Cb%3E.exe"),
            )
            .await;

        response.assert_status(StatusCode::OK);
        let body = response.text();
        assert!(body.contains("<form method=post enctype=multipart/form-data>"));
        assert!(body.contains("File type not allowed: &lt;b&gt;.exe"));
        let cookie = response.header("set-cookie");
        assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn form_page_confirms_stored_name() {
        let h = harness();

        let response = h.server.get("/?name=photo.png").await;

        response.assert_status(StatusCode::OK);
        assert!(response.text().contains("Uploaded <code>photo.png</code>"));
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn fixed_upload_overwrites_previous_content() {
        let h = harness();

        for content in [&b"AAA"[..], &b"BBB"[..]] {
            let response = h
                .server
                .post("/file_upload")
                .multipart(file_form("file", "a.jpg", content))
                .await;
            response.assert_status(StatusCode::OK);
            response.assert_text("file received");
        }

        assert_eq!(stored_files(&h.root), vec!["image.jpg"]);
        assert_eq!(std::fs::read(h.root.join("image.jpg")).unwrap(), b"BBB");
    }

    #[tokio::test]
    async fn fixed_upload_get_reports_status() {
        let h = harness();

        let response = h.server.get("/file_upload").await;

        response.assert_status(StatusCode::OK);
        response.assert_text("file_upload run");
    }

    #[tokio::test]
    async fn fixed_upload_requires_file_part() {
        let h = harness();

        let response = h
            .server
            .post("/file_upload")
            .multipart(file_form("other", "a.jpg", b"AAA"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(stored_files(&h.root).is_empty());
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let h = harness();

        let response = h
            .server
            .post("/file_upload")
            .multipart(file_form("file", "big.jpg", &[7u8; 2048]))
            .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert!(stored_files(&h.root).is_empty());
    }

    #[tokio::test]
    async fn recognition_stores_under_path_name() {
        let h = harness();

        let response = h
            .server
            .post("/recognition/person1.png")
            .multipart(file_form("image", "capture.png", b"face"))
            .await;

        response.assert_status(StatusCode::OK);
        response.assert_text("file received");
        assert_eq!(stored_files(&h.root), vec!["person1.png"]);
        assert_eq!(std::fs::read(h.root.join("person1.png")).unwrap(), b"face");
    }

    #[tokio::test]
    async fn recognition_rejects_traversal() {
        let h = harness();

        let response = h
            .server
            .post("/recognition/..%2Fescape.png")
            .multipart(file_form("image", "capture.png", b"face"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(!h.outer.join("escape.png").exists());
        assert!(stored_files(&h.root).is_empty());
    }

    #[tokio::test]
    async fn recognition_requires_image_part() {
        let h = harness();

        let response = h
            .server
            .post("/recognition/person1.png")
            .multipart(file_form("file", "capture.png", b"face"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(stored_files(&h.root).is_empty());
    }

    #[tokio::test]
    async fn recognition_get_is_not_found() {
        let h = harness();

        let response = h.server.get("/recognition/person1.png").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_reports_storage_state() {
        let h = harness();

        let response = h.server.get("/api/health").await;
        response.assert_status(StatusCode::OK);
        response.assert_json(&serde_json::json!({ "status": "ok" }));

        std::fs::remove_dir_all(&h.root).unwrap();
        let response = h.server.get("/api/health").await;
        response.assert_json(&serde_json::json!({ "status": "degraded" }));
    }

    #[test]
    fn render_form_escapes_stored_name() {
        let page = render_form(None, Some("<script>.png"));
        assert!(page.contains("&lt;script&gt;.png"));
        assert!(!page.contains("<script>"));
    }
}
