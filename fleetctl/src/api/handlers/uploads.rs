//! Image uploads and the public image file route.

use crate::{
    AppState,
    api::models::uploads::UploadResponse,
    errors::{Error, Result},
    images::ImageCategory,
};
use axum::{
    extract::{Json, Multipart, Path, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge { message: e.body_text() }
    } else {
        Error::BadRequest {
            message: format!("Failed to parse multipart data: {e}"),
        }
    }
}

#[utoipa::path(
    post,
    path = "/uploads/images",
    tag = "uploads",
    summary = "Upload an image",
    description = "Multipart form with a `file` part and an optional `category` part \
                   (`drivers`, `vehicles`, `items` or `general`). Accepts jpg, jpeg, png, gif and webp.",
    request_body(content_type = "multipart/form-data", description = "Image file and category"),
    responses(
        (status = 201, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing file, unknown category or unsupported type"),
        (status = 413, description = "File exceeds the upload size limit"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn upload_image(State(state): State<AppState>, mut multipart: Multipart) -> Result<(StatusCode, Json<UploadResponse>)> {
    let max_file_size = state.images.max_file_size();
    let mut category = ImageCategory::General;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "category" => {
                let value = field.text().await.map_err(multipart_error)?;
                category = value.parse()?;
            }
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let mut bytes = Vec::new();
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    if (bytes.len() + chunk.len()) as u64 > max_file_size {
                        tracing::warn!(%filename, max_file_size, "Image upload exceeds size limit");
                        return Err(Error::PayloadTooLarge {
                            message: format!("File exceeds the maximum size of {max_file_size} bytes"),
                        });
                    }
                    bytes.extend_from_slice(&chunk);
                }
                file = Some((filename, bytes));
            }
            other => tracing::debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    let (filename, bytes) = file.ok_or_else(|| Error::bad_request("Missing 'file' field"))?;
    let stored = state.images.save(category, &filename, &bytes).await?;
    tracing::info!(path = %stored.path, size = bytes.len(), "Image uploaded");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            path: stored.path,
            url: stored.url,
            size: bytes.len() as u64,
        }),
    ))
}

/// Serve a stored image with a content type guessed from its extension.
#[tracing::instrument(skip_all)]
pub async fn serve_image(State(state): State<AppState>, Path((category, filename)): Path<(String, String)>) -> Result<Response> {
    tracing::debug!(%category, %filename, "Serving image");
    let bytes = state.images.load(&category, &filename).await?;
    let mime = mime_guess::from_path(&filename).first_or_octet_stream();

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use crate::{api::models::uploads::UploadResponse, test_utils::*};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use sqlx::SqlitePool;

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

    #[sqlx::test]
    #[test_log::test]
    async fn test_upload_then_fetch(pool: SqlitePool) {
        let uploads = tempfile::tempdir().unwrap();
        let app = create_test_app_in(pool, uploads.path()).await;

        let form = MultipartForm::new()
            .add_text("category", "vehicles")
            .add_part("file", Part::bytes(PNG_BYTES.to_vec()).file_name("truck.PNG").mime_type("image/png"));
        let response = app.post("/admin/api/v1/uploads/images").multipart(form).await;
        response.assert_status(StatusCode::CREATED);

        let upload: UploadResponse = response.json();
        assert!(upload.path.starts_with("vehicles/"));
        assert!(upload.path.ends_with(".png"));
        assert_eq!(upload.url, format!("/files/images/{}", upload.path));
        assert_eq!(upload.size, PNG_BYTES.len() as u64);

        let response = app.get(&upload.url).await;
        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "image/png");
        assert_eq!(response.as_bytes().as_ref(), PNG_BYTES);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_upload_rejects_non_images(pool: SqlitePool) {
        let uploads = tempfile::tempdir().unwrap();
        let app = create_test_app_in(pool, uploads.path()).await;

        let form = MultipartForm::new().add_part("file", Part::bytes(b"MZ".to_vec()).file_name("tool.exe"));
        app.post("/admin/api/v1/uploads/images")
            .multipart(form)
            .await
            .assert_status_bad_request();

        let form = MultipartForm::new()
            .add_text("category", "invoices")
            .add_part("file", Part::bytes(PNG_BYTES.to_vec()).file_name("a.png"));
        app.post("/admin/api/v1/uploads/images")
            .multipart(form)
            .await
            .assert_status_bad_request();

        let form = MultipartForm::new().add_text("category", "general");
        app.post("/admin/api/v1/uploads/images")
            .multipart(form)
            .await
            .assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_upload_over_limit_is_payload_too_large(pool: SqlitePool) {
        let uploads = tempfile::tempdir().unwrap();
        let app = create_test_app_in(pool, uploads.path()).await;

        // The test config allows 1 KiB
        let form = MultipartForm::new().add_part("file", Part::bytes(vec![0u8; 2048]).file_name("big.jpg"));
        app.post("/admin/api/v1/uploads/images")
            .multipart(form)
            .await
            .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_serve_rejects_traversal_and_missing(pool: SqlitePool) {
        let uploads = tempfile::tempdir().unwrap();
        let app = create_test_app_in(pool, uploads.path()).await;

        app.get("/files/images/drivers/missing.png").await.assert_status_not_found();
        app.get("/files/images/drivers/..%2F..%2Fconfig.yaml")
            .await
            .assert_status_bad_request();
        app.get("/files/images/secrets/x.png").await.assert_status_bad_request();
    }
}
