use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::error::{NutrError, NutrResult};
use crate::models::{sniff_mime, AnalysisResult, DataUrl};

/// Image bytes ready to be sent as the `image` part.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn from_data_url(url: &DataUrl) -> NutrResult<Self> {
        let (mime, bytes) = url.decode()?;
        Ok(Self { mime, bytes })
    }

    fn file_name(&self) -> String {
        let extension = match self.mime.as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "jpg",
        };
        format!("image.{}", extension)
    }
}

/// Narrow contract over the nutrition-analysis backend.
#[async_trait::async_trait]
pub trait NutritionAnalyzer: Send + Sync {
    async fn analyze(&self, backend_url: &str, api_key: &str, image: ImagePayload) -> NutrResult<AnalysisResult>;

    /// Downloads a remote image and returns it as a data URL.
    async fn fetch_image(&self, url: &str) -> NutrResult<DataUrl>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub struct HttpAnalysisClient {
    client: reqwest::Client,
}

impl HttpAnalysisClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(backend_url: &str) -> String {
        format!("{}/analyze-food", backend_url.trim().trim_end_matches('/'))
    }
}

impl Default for HttpAnalysisClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl NutritionAnalyzer for HttpAnalysisClient {
    async fn analyze(&self, backend_url: &str, api_key: &str, image: ImagePayload) -> NutrResult<AnalysisResult> {
        let url = Self::endpoint(backend_url);
        log::debug!("📊 Image payload: {} bytes ({})", image.bytes.len(), image.mime);

        let file_name = image.file_name();
        let part = Part::bytes(image.bytes)
            .file_name(file_name)
            .mime_str(&image.mime)?;
        let form = Form::new().part("image", part).text("apiKey", api_key.to_string());

        log::info!("🤖 Sending image to {}", url);

        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        log::debug!("📥 Analysis response status: {}", status);

        let body = response.text().await?;

        if !status.is_success() {
            log::error!("❌ Analysis backend error ({}): {}", status, body);
            return Err(match serde_json::from_str::<ErrorBody>(&body) {
                Ok(ErrorBody { error: Some(message) }) if !message.trim().is_empty() => NutrError::Remote(message),
                _ => NutrError::RemoteStatus(status.as_u16()),
            });
        }

        let result: AnalysisResult =
            serde_json::from_str(&body).map_err(|e| NutrError::MalformedResponse(e.to_string()))?;
        log::info!("✅ Analysis received");

        Ok(result)
    }

    async fn fetch_image(&self, url: &str) -> NutrResult<DataUrl> {
        log::info!("📥 Downloading image from {}", url);

        let download_error = |e: reqwest::Error| NutrError::ImageDownload(e.to_string());

        let response = self.client.get(url).send().await.map_err(download_error)?;
        let status = response.status();
        if !status.is_success() {
            log::error!("❌ Image download failed ({}) for {}", status, url);
            return Err(NutrError::ImageDownload(format!("status {}", status.as_u16())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_string())
            .filter(|v| v.starts_with("image/"));

        let bytes = response.bytes().await.map_err(download_error)?;
        if bytes.is_empty() {
            return Err(NutrError::ImageDownload("empty response body".to_string()));
        }
        let mime = content_type.unwrap_or_else(|| sniff_mime(&bytes, None).to_string());
        log::debug!("📊 Downloaded {} bytes ({})", bytes.len(), mime);

        Ok(DataUrl::encode(&mime, &bytes))
    }
}
