use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{http::header::ContentType, web, HttpResponse};
use futures::StreamExt;
use serde::Serialize;
use uuid::Uuid;

use super::{pages, AppState};
use crate::{
    error::{Result, ValidationError, ZombieError},
    intake::{IntakeValidator, IMAGE_FIELD},
    models::IncomingUpload,
};

pub const SERVICE_NAME: &str = "zombie-transformer";

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(pages::index_page())
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthStatus {
        status: "ok",
        service: SERVICE_NAME,
    })
}

pub async fn generate(
    state: web::Data<AppState>,
    payload: Multipart,
) -> std::result::Result<HttpResponse, ZombieError> {
    let request_id = Uuid::new_v4().simple().to_string()[..8].to_string();

    match generate_inner(&state, payload, &request_id).await {
        Ok(image_src) => Ok(HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(pages::result_page(&image_src))),
        Err(e) => {
            log::error!("[req:{}] ❌ Error: {}", request_id, e);
            Err(e)
        }
    }
}

async fn generate_inner(state: &AppState, payload: Multipart, request_id: &str) -> Result<String> {
    let upload = read_image_field(payload, &state.intake)
        .await?
        .ok_or_else(|| ValidationError::MissingFile {
            field: IMAGE_FIELD.to_string(),
        })?;
    let pipeline = state
        .pipeline
        .as_ref()
        .map_err(|reason| ZombieError::Config(reason.clone()))?;

    let asset = state.intake.accept(upload).await?;
    log::info!("[req:{}] Processing: {}", request_id, asset.asset().id);

    let result = pipeline.run(asset).await?;
    Ok(result.src())
}

/// Pulls the `image` field out of the form. Other fields are drained and ignored.
///
/// The media type and size limit are checked while streaming so a bad upload is
/// rejected before it is buffered in full.
pub async fn read_image_field(
    mut payload: Multipart,
    intake: &IntakeValidator,
) -> Result<Option<IncomingUpload>> {
    let mut upload: Option<IncomingUpload> = None;

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            // Not a multipart request at all, so there is no file to find.
            Err(e) if is_not_multipart(&e) => return Ok(None),
            Err(e) => return Err(ValidationError::Multipart(e.to_string()).into()),
        };
        let name = field.name().unwrap_or_default().to_string();

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        // Browsers send an empty part when no file was chosen; a plain text field has no filename.
        let no_file_chosen = filename.as_deref().map_or(true, str::is_empty);

        if name != IMAGE_FIELD || upload.is_some() || no_file_chosen {
            drain(&mut field).await?;
            continue;
        }

        let media_type = field.content_type().map(|mime| mime.essence_str().to_string());
        intake.check_media_type(&name, media_type.as_deref())?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ValidationError::Multipart(e.to_string()))?;
            intake.check_size(&name, (bytes.len() + chunk.len()) as u64)?;
            bytes.extend_from_slice(&chunk);
        }

        let mut incoming = IncomingUpload::new(name).with_bytes(bytes);
        incoming.original_filename = filename;
        incoming.media_type = media_type;
        upload = Some(incoming);
    }

    Ok(upload)
}

fn is_not_multipart(error: &MultipartError) -> bool {
    matches!(
        error,
        MultipartError::ContentTypeMissing
            | MultipartError::ContentTypeParse
            | MultipartError::ContentTypeIncompatible
            | MultipartError::BoundaryMissing
    )
}

async fn drain(field: &mut Field) -> Result<()> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(|e| ValidationError::Multipart(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        intake::IntakeValidator,
        models::{ControlParameters, TransformationRequest, TransformationResult},
        pipeline::TransformPipeline,
        providers::{InputPolicy, Transformer},
        server::configure,
    };
    use actix_web::{http::StatusCode, test, App};
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::Arc;

    const BOUNDARY: &str = "----zombieboundary";

    struct FixedTransformer {
        fail: bool,
    }

    #[async_trait]
    impl Transformer for FixedTransformer {
        fn name(&self) -> &str {
            "fixed"
        }

        fn input_policy(&self) -> InputPolicy {
            InputPolicy::Original
        }

        fn parameters(&self) -> ControlParameters {
            ControlParameters::REPLICATE
        }

        async fn transform(&self, _request: TransformationRequest) -> Result<TransformationResult> {
            if self.fail {
                Err(ZombieError::transformation(
                    "fixed",
                    Some(503),
                    "Service Unavailable: try later",
                ))
            } else {
                Ok(TransformationResult::remote(
                    "https://replicate.delivery/xezq/zombie.png",
                ))
            }
        }
    }

    fn state(upload_dir: &Path, fail: bool) -> web::Data<AppState> {
        web::Data::new(AppState {
            intake: IntakeValidator::new(upload_dir),
            pipeline: Ok(TransformPipeline::new(Arc::new(FixedTransformer { fail }))),
        })
    }

    fn small_png() -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(4, 4)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn text_field_body(field: &str, value: &str) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn generate_request(body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/generate")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(body)
    }

    fn upload_dir_is_empty(dir: &Path) -> bool {
        match std::fs::read_dir(dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        }
    }

    #[actix_web::test]
    async fn test_health_is_fixed_json() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState {
                    intake: IntakeValidator::new(dir.path()),
                    pipeline: Err("no provider".to_string()),
                }))
                .configure(configure),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(
            body.as_ref(),
            br#"{"status":"ok","service":"zombie-transformer"}"#
        );
    }

    #[actix_web::test]
    async fn test_index_serves_form() {
        let dir = tempfile::tempdir().unwrap();
        let app =
            test::init_service(App::new().app_data(state(dir.path(), false)).configure(configure))
                .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains(r#"name="image""#));
    }

    #[actix_web::test]
    async fn test_generate_renders_result_page() {
        let dir = tempfile::tempdir().unwrap();
        let app =
            test::init_service(App::new().app_data(state(dir.path(), false)).configure(configure))
                .await;

        let body = multipart_body("image", "me.png", "image/png", &small_png());
        let resp = test::call_service(&app, generate_request(body).to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(html.contains(r#"<img src="https://replicate.delivery/xezq/zombie.png""#));
        assert!(html.contains(r#"download="zombie-me.png""#));
        assert!(upload_dir_is_empty(dir.path()));
    }

    #[actix_web::test]
    async fn test_upstream_failure_renders_500_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let app =
            test::init_service(App::new().app_data(state(dir.path(), true)).configure(configure))
                .await;

        let body = multipart_body("image", "me.png", "image/png", &small_png());
        let resp = test::call_service(&app, generate_request(body).to_request()).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(html.contains("Transformation Failed"));
        assert!(html.contains("503"));
        assert!(html.contains("try later"));
        assert!(upload_dir_is_empty(dir.path()));
    }

    #[actix_web::test]
    async fn test_missing_file_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let app =
            test::init_service(App::new().app_data(state(dir.path(), false)).configure(configure))
                .await;

        let body = multipart_body("image", "", "application/octet-stream", b"");
        let resp = test::call_service(&app, generate_request(body).to_request()).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(html.contains("No image uploaded"));
    }

    #[actix_web::test]
    async fn test_no_multipart_body_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let app =
            test::init_service(App::new().app_data(state(dir.path(), false)).configure(configure))
                .await;

        let bare = test::TestRequest::post().uri("/generate").to_request();
        let resp = test::call_service(&app, bare).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(html.contains("No image uploaded"));

        let urlencoded = test::TestRequest::post()
            .uri("/generate")
            .insert_header(("content-type", "application/x-www-form-urlencoded"))
            .set_payload("image=me.png")
            .to_request();
        let resp = test::call_service(&app, urlencoded).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(upload_dir_is_empty(dir.path()));
    }

    #[actix_web::test]
    async fn test_image_text_field_counts_as_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let app =
            test::init_service(App::new().app_data(state(dir.path(), false)).configure(configure))
                .await;

        let body = text_field_body("image", "not a file");
        let resp = test::call_service(&app, generate_request(body).to_request()).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(html.contains("No image uploaded"));
        assert!(upload_dir_is_empty(dir.path()));
    }

    #[actix_web::test]
    async fn test_upload_at_exact_limit_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let state = web::Data::new(AppState {
            intake: IntakeValidator::new(dir.path()).with_max_bytes(64),
            pipeline: Ok(TransformPipeline::new(Arc::new(FixedTransformer {
                fail: false,
            }))),
        });
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let body = multipart_body("image", "edge.png", "image/png", &[7u8; 64]);
        let resp = test::call_service(&app, generate_request(body).to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(upload_dir_is_empty(dir.path()));
    }

    #[actix_web::test]
    async fn test_non_image_is_rejected_without_write() {
        let dir = tempfile::tempdir().unwrap();
        let app =
            test::init_service(App::new().app_data(state(dir.path(), false)).configure(configure))
                .await;

        let body = multipart_body("image", "notes.txt", "text/plain", b"just text");
        let resp = test::call_service(&app, generate_request(body).to_request()).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(html.contains("Only image files are allowed"));
        assert!(upload_dir_is_empty(dir.path()));
    }

    #[actix_web::test]
    async fn test_oversized_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = web::Data::new(AppState {
            intake: IntakeValidator::new(dir.path()).with_max_bytes(16),
            pipeline: Ok(TransformPipeline::new(Arc::new(FixedTransformer {
                fail: false,
            }))),
        });
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let body = multipart_body("image", "big.png", "image/png", &[7u8; 64]);
        let resp = test::call_service(&app, generate_request(body).to_request()).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(html.contains("too large"));
        assert!(upload_dir_is_empty(dir.path()));
    }

    #[actix_web::test]
    async fn test_unconfigured_provider_is_500_without_write() {
        let dir = tempfile::tempdir().unwrap();
        let state = web::Data::new(AppState {
            intake: IntakeValidator::new(dir.path()),
            pipeline: Err("No transformation provider configured".to_string()),
        });
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let body = multipart_body("image", "me.png", "image/png", &small_png());
        let resp = test::call_service(&app, generate_request(body).to_request()).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(upload_dir_is_empty(dir.path()));
    }
}
