use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{NutrError, NutrResult};
use crate::models::{sniff_mime, AnalysisResult, DataUrl, FacingMode};
use crate::services::camera::encode_jpeg;
use crate::services::{CameraDevice, ImagePayload, NutritionAnalyzer, VideoStream};

/// State behind the capture-and-submit screen.
///
/// Every operation catches its own failure and stores it as the single error
/// message; nothing is returned to the caller beyond a success flag.
pub struct CaptureFlow {
    analyzer: Arc<dyn NutritionAnalyzer>,
    camera: Arc<dyn CameraDevice>,
    api_key: String,
    backend_url: String,
    max_image_bytes: Option<u64>,
    ready_timeout: Duration,
    image: Option<DataUrl>,
    result: Option<AnalysisResult>,
    error: Option<String>,
    loading: bool,
    facing: FacingMode,
    stream: Option<Box<dyn VideoStream>>,
}

impl CaptureFlow {
    pub fn new(config: &Config, analyzer: Arc<dyn NutritionAnalyzer>, camera: Arc<dyn CameraDevice>) -> Self {
        Self {
            analyzer,
            camera,
            api_key: config.api_key.clone(),
            backend_url: config.backend_url.clone(),
            max_image_bytes: config.max_image_bytes,
            ready_timeout: config.camera_ready_timeout,
            image: None,
            result: None,
            error: None,
            loading: false,
            facing: FacingMode::default(),
            stream: None,
        }
    }

    pub fn image(&self) -> Option<&DataUrl> {
        self.image.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn camera_active(&self) -> bool {
        self.stream.as_ref().map(|s| s.is_active()).unwrap_or(false)
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    /// Analysis is possible only with an image and nothing in flight.
    pub fn can_submit(&self) -> bool {
        self.image.is_some() && !self.loading
    }

    pub async fn acquire_file(&mut self, path: &Path) -> bool {
        self.error = None;
        let outcome = self.read_file(path).await.map(|url| self.replace_image(url));
        self.finish(outcome)
    }

    async fn read_file(&self, path: &Path) -> NutrResult<DataUrl> {
        let read_error = |source| NutrError::FileRead {
            path: path.display().to_string(),
            source,
        };

        let metadata = tokio::fs::metadata(path).await.map_err(read_error)?;
        self.check_size(metadata.len())?;

        let bytes = tokio::fs::read(path).await.map_err(read_error)?;
        if bytes.is_empty() {
            return Err(NutrError::EmptyFile(path.display().to_string()));
        }
        let mime = sniff_mime(&bytes, Some(path));
        log::info!("📁 Loaded {} ({} bytes, {})", path.display(), bytes.len(), mime);

        Ok(DataUrl::encode(mime, &bytes))
    }

    pub async fn acquire_url(&mut self, url: &str) -> bool {
        self.error = None;
        let url = url.trim();
        let fetched = if url.starts_with("data:") {
            DataUrl::parse(url)
        } else {
            self.analyzer.fetch_image(url).await
        };
        let outcome = match fetched {
            Ok(data_url) => self.check_data_url_size(&data_url).map(|_| data_url),
            Err(e) => Err(e),
        };
        let outcome = outcome.map(|url| self.replace_image(url));
        self.finish(outcome)
    }

    pub async fn start_camera(&mut self) -> bool {
        self.error = None;
        let outcome = self.open_stream().await;
        self.finish(outcome)
    }

    async fn open_stream(&mut self) -> NutrResult<()> {
        // Never hold two live streams
        self.stop_camera();

        let mut stream = self.camera.open(self.facing).await?;
        match tokio::time::timeout(self.ready_timeout, stream.ready()).await {
            Ok(Ok(())) => {
                log::info!("🎥 {} camera ready", stream.facing());
                self.stream = Some(stream);
                Ok(())
            }
            Ok(Err(e)) => {
                stream.stop();
                Err(e)
            }
            Err(_) => {
                stream.stop();
                Err(NutrError::CameraNotReady(self.ready_timeout.as_millis() as u64))
            }
        }
    }

    /// Toggles front/back. An active camera is restarted on the new side.
    pub async fn switch_facing(&mut self) -> bool {
        self.facing = self.facing.toggled();
        log::info!("🔄 Facing mode switched to {}", self.facing);

        if self.camera_active() {
            self.start_camera().await
        } else {
            true
        }
    }

    pub fn capture(&mut self) -> bool {
        self.error = None;
        let outcome = self.grab_frame().map(|url| self.replace_image(url));
        let captured = self.finish(outcome);
        if captured {
            self.stop_camera();
        }
        captured
    }

    fn grab_frame(&self) -> NutrResult<DataUrl> {
        let stream = self
            .stream
            .as_ref()
            .filter(|s| s.is_active())
            .ok_or(NutrError::CameraInactive)?;

        let frame = stream.frame()?;
        let jpeg = encode_jpeg(&frame)?;
        log::info!("📸 Captured {}x{} frame ({} bytes)", frame.width(), frame.height(), jpeg.len());

        Ok(DataUrl::encode("image/jpeg", &jpeg))
    }

    pub fn stop_camera(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
    }

    /// Exclusive access keeps a second submit out while `loading` is set.
    pub async fn submit(&mut self) -> bool {
        let checked = self.check_preconditions().map(|_| ());
        if let Err(e) = checked {
            return self.finish(Err(e));
        }

        self.loading = true;
        self.error = None;
        self.result = None;

        let outcome = self.send().await;
        self.loading = false;

        let outcome = outcome.map(|result| self.result = Some(result));
        self.finish(outcome)
    }

    fn check_preconditions(&self) -> NutrResult<&DataUrl> {
        if self.api_key.trim().is_empty() {
            return Err(NutrError::MissingApiKey);
        }
        if self.backend_url.trim().is_empty() {
            return Err(NutrError::MissingBackendUrl);
        }
        self.image.as_ref().ok_or(NutrError::NoImage)
    }

    async fn send(&self) -> NutrResult<AnalysisResult> {
        let image = self.check_preconditions()?;
        let payload = ImagePayload::from_data_url(image)?;
        self.analyzer.analyze(&self.backend_url, &self.api_key, payload).await
    }

    pub fn reset(&mut self) {
        self.stop_camera();
        self.image = None;
        self.result = None;
        self.error = None;
        log::debug!("🧹 Capture flow reset");
    }

    fn replace_image(&mut self, url: DataUrl) {
        log::debug!("🖼️ Image input replaced: {}", url);
        self.image = Some(url);
        self.result = None;
    }

    fn check_size(&self, size: u64) -> NutrResult<()> {
        match self.max_image_bytes {
            Some(limit) if size > limit => Err(NutrError::ImageTooLarge { size, limit }),
            _ => Ok(()),
        }
    }

    fn check_data_url_size(&self, url: &DataUrl) -> NutrResult<()> {
        if self.max_image_bytes.is_none() {
            return Ok(());
        }
        let (_, bytes) = url.decode()?;
        self.check_size(bytes.len() as u64)
    }

    fn finish(&mut self, outcome: NutrResult<()>) -> bool {
        match outcome {
            Ok(()) => true,
            Err(e) => {
                log::error!("❌ {}", e);
                self.error = Some(e.to_string());
                false
            }
        }
    }
}
