//! End-to-end flows through `GuessService` with a fake model.

mod common;

use std::sync::Arc;

use common::fake_backends::ScriptedBackend;
use common::test_images::{gradient, png_bytes, write_sample};
use pixel_guess::config::ServerConfig;
use pixel_guess::processing::codec::MAX_SIDE;
use pixel_guess::{ErrorSeverity, HasSeverity};
use pixel_guess::{GuessService, ImageSource, ResizeRequest, ResizeSpec};

fn service_in(root: &std::path::Path, backend: Arc<ScriptedBackend>) -> GuessService {
    let config = ServerConfig {
        content_root: root.to_path_buf(),
        endpoint: Some("http://127.0.0.1:1/unused".to_string()),
        ..ServerConfig::default()
    };
    config.validate().unwrap();
    GuessService::from_config(&config, backend)
}

fn stored(id: &str, spec: ResizeSpec) -> ResizeRequest {
    ResizeRequest {
        source: ImageSource::Stored(id.to_string()),
        spec,
    }
}

#[tokio::test]
async fn test_upload_then_shrink_then_guess() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(ScriptedBackend::succeeding());
    let service = service_in(dir.path(), backend.clone());

    let uploaded = service.upload(png_bytes(&gradient(100, 50))).await.unwrap();
    assert_eq!((uploaded.width, uploaded.height), (100, 50));
    let id = uploaded.image_id.as_str();

    let jpeg = service
        .resized(&stored(id, ResizeSpec::Width(50)))
        .await
        .unwrap();
    let small = image::load_from_memory(&jpeg).unwrap();
    assert_eq!((small.width(), small.height()), (50, 25));

    let answer = service
        .guess(&stored(id, ResizeSpec::Ratio(0.1)))
        .await
        .unwrap();
    assert_eq!(answer.as_text(), Some("a 10x5 picture"));
    assert_eq!(
        backend.prompts(),
        vec![pixel_guess::config::DEFAULT_PROMPT.to_string()]
    );
}

#[tokio::test]
async fn test_rejections() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(dir.path(), Arc::new(ScriptedBackend::succeeding()));
    let uploaded = service.upload(png_bytes(&gradient(100, 50))).await.unwrap();

    let err = service
        .resized(&stored(uploaded.image_id.as_str(), ResizeSpec::Ratio(2.0)))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "invalid_spec");

    let err = service
        .resized(&stored("doesnotexist", ResizeSpec::Width(8)))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "not_found");
    assert_eq!(err.to_string(), "no such image: doesnotexist");
}

#[tokio::test]
async fn test_tiny_widths_never_reach_zero_height() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(dir.path(), Arc::new(ScriptedBackend::succeeding()));
    let uploaded = service.upload(png_bytes(&gradient(400, 10))).await.unwrap();

    let jpeg = service
        .resized(&stored(uploaded.image_id.as_str(), ResizeSpec::Width(8)))
        .await
        .unwrap();
    let small = image::load_from_memory(&jpeg).unwrap();
    assert_eq!((small.width(), small.height()), (8, 1));
}

#[tokio::test]
async fn test_samples_are_resized_like_uploads() {
    let dir = tempfile::tempdir().unwrap();
    write_sample(dir.path(), "sample18.jpg", 64, 48);
    let service = service_in(dir.path(), Arc::new(ScriptedBackend::succeeding()));

    let request = ResizeRequest {
        source: ImageSource::Sample("samples/sample18.jpg".to_string()),
        spec: ResizeSpec::Width(16),
    };
    let answer = service.guess(&request).await.unwrap();
    assert_eq!(answer.as_text(), Some("a 16x12 picture"));
    assert!(service.store().is_empty());

    let missing = ResizeRequest {
        source: ImageSource::Sample("samples/missing.jpg".to_string()),
        spec: ResizeSpec::Width(16),
    };
    let err = service.resized(&missing).await.unwrap_err();
    assert_eq!(err.category(), "io");
}

#[tokio::test(start_paused = true)]
async fn test_model_outage_surfaces_as_inference_error() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(ScriptedBackend::always_failing());
    let service = service_in(dir.path(), backend.clone());
    let uploaded = service.upload(png_bytes(&gradient(20, 20))).await.unwrap();

    let err = service
        .guess(&stored(uploaded.image_id.as_str(), ResizeSpec::Width(10)))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "inference");
    assert!(!err.is_client_error());
    assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn test_uploads_jpeg_cannot_hold_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(dir.path(), Arc::new(ScriptedBackend::succeeding()));

    let err = service
        .upload(png_bytes(&gradient(70_000, 1)))
        .await
        .unwrap_err();
    assert_eq!(err.category(), "decode");
    assert_eq!(err.severity(), ErrorSeverity::Warning);
    assert!(service.store().is_empty());
}

#[tokio::test]
async fn test_every_accepted_upload_resizes_at_full_size() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(dir.path(), Arc::new(ScriptedBackend::succeeding()));
    let uploaded = service
        .upload(png_bytes(&gradient(MAX_SIDE, 1)))
        .await
        .unwrap();
    let id = uploaded.image_id.as_str();

    for spec in [ResizeSpec::Ratio(1.0), ResizeSpec::Width(MAX_SIDE)] {
        let jpeg = service.resized(&stored(id, spec)).await.unwrap();
        let img = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((img.width(), img.height()), (MAX_SIDE, 1));
    }
}
