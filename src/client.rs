use reqwest::{multipart::{Form, Part}, Client};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{info, warn, error};

use crate::{
    config::ClientConfig,
    models::{AnimatedVideoResponse, CaptionResponse, GenerationResult, ImageResponse, MediaRequest, StoredImage, VideoCaptionResponse, DEFAULT_ANIMATION_STYLE},
    response::{parse_response, ApiError},
    upload::{format_file_size, Caption, MediaFile, MediaKind, ValidationError},
};

pub struct MediaClient {
    client: Client,
    config: ClientConfig,
}

impl MediaClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { client: Client::new(), config }
    }

    pub fn config(&self) -> &ClientConfig { &self.config }

    /// Resolves a backend-relative media path (e.g. a stored image's
    /// `image_url`). Absolute URLs are returned unchanged.
    pub fn media_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            self.config.endpoint(path)
        }
    }

    /// Probes `/health`, then `/` if that did not succeed. Never fails.
    pub async fn check_connectivity(&self) -> bool {
        if self.probe("/health").await {
            return true;
        }
        warn!("⚠️ Health check failed, trying root endpoint");
        self.probe("/").await
    }

    async fn probe(&self, path: &str) -> bool {
        let url = self.config.endpoint(path);
        match self.client.get(&url).timeout(self.config.probe_timeout).send().await {
            Ok(response) => {
                let ok = response.status().is_success();
                info!("🔌 Probe {} -> {}", url, response.status());
                ok
            }
            Err(e) => {
                warn!("🔌 Probe {} failed: {}", url, e);
                false
            }
        }
    }

    pub async fn generate_caption(&self, file: &MediaFile) -> Result<CaptionResponse, ApiError> {
        self.upload("/api/generate-caption", MediaKind::Image, file).await
    }

    pub async fn generate_video_caption(&self, file: &MediaFile) -> Result<VideoCaptionResponse, ApiError> {
        self.upload("/api/generate-video-caption", MediaKind::Video, file).await
    }

    pub async fn generate_image(&self, caption: &Caption) -> Result<ImageResponse, ApiError> {
        self.post_json("/api/generate-image", json!({ "caption": caption.as_str() })).await
    }

    pub async fn generate_animated_video(&self, caption: &Caption, style: Option<&str>) -> Result<AnimatedVideoResponse, ApiError> {
        let style = style.unwrap_or(DEFAULT_ANIMATION_STYLE);
        self.post_json("/api/generate-animated-video", json!({ "caption": caption.as_str(), "style": style })).await
    }

    pub async fn list_stored_images(&self) -> Result<Vec<StoredImage>, ApiError> {
        let url = self.config.endpoint("/api/images");
        info!("📚 Fetching stored images from {}", url);
        let response = self.client.get(&url).send().await.map_err(|e| network_error(&url, e))?;
        parse_response(response).await
    }

    pub async fn generate(&self, request: MediaRequest) -> Result<GenerationResult, ApiError> {
        Ok(match request {
            MediaRequest::Image(file) => GenerationResult::Caption(self.generate_caption(&file).await?),
            MediaRequest::Video(file) => GenerationResult::VideoCaption(self.generate_video_caption(&file).await?),
            MediaRequest::ImageFromCaption(caption) => GenerationResult::Image(self.generate_image(&caption).await?),
            MediaRequest::VideoFromCaption { caption, style } => {
                GenerationResult::Video(self.generate_animated_video(&caption, Some(&style)).await?)
            }
        })
    }

    async fn upload<T: DeserializeOwned>(&self, path: &str, expected: MediaKind, file: &MediaFile) -> Result<T, ApiError> {
        if file.kind() != expected {
            return Err(ValidationError::WrongKind { expected, actual: file.kind() }.into());
        }

        let part = Part::stream_with_length(file.bytes().clone(), file.size())
            .file_name(file.filename().to_string())
            .mime_str(file.mime())
            .map_err(|_| ValidationError::WrongType(expected))?;
        let form = Form::new().part(expected.form_field(), part);

        let url = self.config.endpoint(path);
        info!("📤 Uploading {} ({}, {}) to {}", file.filename(), file.mime(), format_file_size(file.size()), url);

        let response = self.client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| network_error(&url, e))?;
        info!("📥 Response status: {}", response.status());
        parse_response(response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T, ApiError> {
        let url = self.config.endpoint(path);
        info!("📤 POST {} body={}", url, body);

        let response = self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(&url, e))?;
        info!("📥 Response status: {}", response.status());
        parse_response(response).await
    }
}

fn network_error(url: &str, e: reqwest::Error) -> ApiError {
    error!("❌ Request to {} failed: {}", url, e);
    ApiError::Network(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use wiremock::matchers::{body_json, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> MediaClient {
        let mut config = ClientConfig::new(server.uri());
        config.probe_timeout = Duration::from_millis(200);
        MediaClient::new(config)
    }

    fn png(name: &str, len: usize) -> MediaFile {
        MediaFile::new(MediaKind::Image, name, "image/png", vec![7u8; len]).unwrap()
    }

    #[tokio::test]
    async fn caption_upload_uses_image_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate-caption"))
            .and(body_string_contains("name=\"image\""))
            .and(body_string_contains("filename=\"dog.png\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "caption": "A puppy", "id": "42" })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).generate_caption(&png("dog.png", 16)).await.unwrap();
        assert_eq!(result, CaptionResponse { caption: "A puppy".into(), image_url: None, id: Some("42".into()) });
    }

    #[tokio::test]
    async fn video_caption_uses_video_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate-video-caption"))
            .and(body_string_contains("name=\"video\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "caption": "A street", "summary": "People walk", "animatedVideoUrl": "/v.mp4"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let file = MediaFile::new(MediaKind::Video, "city.mp4", "video/mp4", vec![1u8; 32]).unwrap();
        let result = client_for(&server).generate(MediaRequest::Video(file)).await.unwrap();
        match result {
            GenerationResult::VideoCaption(r) => {
                assert_eq!(r.summary, "People walk");
                assert_eq!(r.animated_video_url.as_deref(), Some("/v.mp4"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn wrong_kind_never_reaches_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let video = MediaFile::new(MediaKind::Video, "clip.mp4", "video/mp4", vec![0u8; 8]).unwrap();
        let err = client_for(&server).generate_caption(&video).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(ValidationError::WrongKind { .. })));
        assert_eq!(err.to_string(), "Expected an image file, got a video file");
    }

    #[tokio::test]
    async fn oversized_image_is_rejected_before_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let big = MediaFile::new(MediaKind::Image, "big.png", "image/png", vec![0u8; 6 * 1024 * 1024]);
        assert!(matches!(big, Err(ValidationError::TooLarge { .. })));
    }

    #[tokio::test]
    async fn image_generation_sends_trimmed_caption() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate-image"))
            .and(body_json(json!({ "caption": "a dog in the park" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "imageUrl": "/static/images/dog.jpeg" })))
            .expect(1)
            .mount(&server)
            .await;

        let caption = Caption::new("  a dog in the park ").unwrap();
        let result = client_for(&server).generate_image(&caption).await.unwrap();
        assert_eq!(result.image_url, "/static/images/dog.jpeg");
    }

    #[tokio::test]
    async fn animated_video_defaults_style() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate-animated-video"))
            .and(body_json(json!({ "caption": "a lake", "style": "ghibli" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "videoUrl": "/static/videos/ghibli.mp4" })))
            .expect(1)
            .mount(&server)
            .await;

        let caption = Caption::new("a lake").unwrap();
        let result = client_for(&server).generate_animated_video(&caption, None).await.unwrap();
        assert_eq!(result.video_url, "/static/videos/ghibli.mp4");
    }

    #[tokio::test]
    async fn server_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate-image"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "No caption provided" })))
            .mount(&server)
            .await;

        let caption = Caption::new("x").unwrap();
        let err = client_for(&server).generate_image(&caption).await.unwrap_err();
        assert_eq!(err.to_string(), "No caption provided");
    }

    #[tokio::test]
    async fn html_success_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/images"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
            .mount(&server)
            .await;

        let err = client_for(&server).list_stored_images().await.unwrap_err();
        assert!(matches!(err, ApiError::NonJson { status: 200, .. }));
    }

    #[tokio::test]
    async fn stored_images_keep_backend_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/images"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "b", "image_url": "/static/images/dog.jpeg", "caption": "dog", "created_at": "Thu, 02 May 2024 00:00:00 GMT" },
                { "id": "a", "image_url": "/uploads/lake.png", "caption": "lake", "original_filename": "lake.png", "created_at": "2024-05-01T00:00:00.123456" }
            ])))
            .mount(&server)
            .await;

        let images = client_for(&server).list_stored_images().await.unwrap();
        let ids: Vec<_> = images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(images[1].original_filename.as_deref(), Some("lake.png"));
    }

    #[tokio::test]
    async fn connectivity_accepts_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/health")).respond_with(ResponseTemplate::new(200)).mount(&server).await;
        Mock::given(method("GET")).and(path("/")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        assert!(client_for(&server).check_connectivity().await);
    }

    #[tokio::test]
    async fn connectivity_falls_back_to_root() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/health")).respond_with(ResponseTemplate::new(404)).mount(&server).await;
        Mock::given(method("GET")).and(path("/")).respond_with(ResponseTemplate::new(204)).expect(1).mount(&server).await;

        assert!(client_for(&server).check_connectivity().await);
    }

    #[tokio::test]
    async fn connectivity_falls_back_after_health_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;
        Mock::given(method("GET")).and(path("/")).respond_with(ResponseTemplate::new(200)).expect(1).mount(&server).await;

        assert!(client_for(&server).check_connectivity().await);
    }

    #[tokio::test]
    async fn connectivity_is_false_when_both_probes_time_out() {
        let server = MockServer::start().await;
        let slow = ResponseTemplate::new(200).set_delay(Duration::from_secs(2));
        Mock::given(method("GET")).and(path("/health")).respond_with(slow.clone()).mount(&server).await;
        Mock::given(method("GET")).and(path("/")).respond_with(slow).mount(&server).await;

        assert!(!client_for(&server).check_connectivity().await);
    }

    #[tokio::test]
    async fn connectivity_is_false_when_unreachable() {
        let mut config = ClientConfig::new("http://127.0.0.1:1");
        config.probe_timeout = Duration::from_millis(200);
        assert!(!MediaClient::new(config).check_connectivity().await);
    }

    #[test]
    fn media_url_resolves_relative_paths() {
        let client = MediaClient::new(ClientConfig::new("https://api.example.com"));
        assert_eq!(client.media_url("/uploads/a.png"), "https://api.example.com/uploads/a.png");
        assert_eq!(client.media_url("https://cdn.example.com/a.png"), "https://cdn.example.com/a.png");
    }
}
