use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::PathBuf;

use crate::error::{NutrError, NutrResult};
use crate::models::FacingMode;

/// A live stream from one camera. Tracks stay open until `stop`.
#[async_trait::async_trait]
pub trait VideoStream: Send {
    /// Resolves once the stream can deliver frames.
    async fn ready(&mut self) -> NutrResult<()>;

    fn frame(&self) -> NutrResult<RgbImage>;

    /// Releases the hardware tracks. Calling it twice is a no-op.
    fn stop(&mut self);

    fn is_active(&self) -> bool;

    fn facing(&self) -> FacingMode;
}

/// Anything that can hand out video streams for a facing mode.
#[async_trait::async_trait]
pub trait CameraDevice: Send + Sync {
    async fn open(&self, facing: FacingMode) -> NutrResult<Box<dyn VideoStream>>;
}

pub fn encode_jpeg(frame: &RgbImage) -> NutrResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(frame.clone())
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|e| NutrError::CaptureFailed(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Virtual camera that serves one still image per facing mode.
///
/// Used where no capture hardware is reachable from the terminal; point
/// `CAMERA_FRONT_SOURCE` / `CAMERA_BACK_SOURCE` at image files.
pub struct FileCamera {
    front: Option<PathBuf>,
    back: Option<PathBuf>,
}

impl FileCamera {
    pub fn new(front: Option<PathBuf>, back: Option<PathBuf>) -> Self {
        Self { front, back }
    }

    fn source(&self, facing: FacingMode) -> Option<&PathBuf> {
        match facing {
            FacingMode::User => self.front.as_ref(),
            FacingMode::Environment => self.back.as_ref(),
        }
    }
}

#[async_trait::async_trait]
impl CameraDevice for FileCamera {
    async fn open(&self, facing: FacingMode) -> NutrResult<Box<dyn VideoStream>> {
        let path = self.source(facing).ok_or_else(|| {
            NutrError::CameraUnavailable(format!("no {} camera found", facing))
        })?;

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(NutrError::CameraUnavailable(format!(
                "{} camera source {} does not exist",
                facing,
                path.display()
            )));
        }

        log::info!("📷 Opened {} camera ({})", facing, path.display());
        Ok(Box::new(FileStream {
            path: path.clone(),
            facing,
            frame: None,
            active: true,
        }))
    }
}

struct FileStream {
    path: PathBuf,
    facing: FacingMode,
    frame: Option<RgbImage>,
    active: bool,
}

#[async_trait::async_trait]
impl VideoStream for FileStream {
    async fn ready(&mut self) -> NutrResult<()> {
        if !self.active {
            return Err(NutrError::CameraInactive);
        }
        if self.frame.is_some() {
            return Ok(());
        }

        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| NutrError::CameraUnavailable(e.to_string()))?;
        let frame = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes).map(|img| img.to_rgb8()))
            .await
            .map_err(|e| NutrError::CameraUnavailable(e.to_string()))?
            .map_err(|e| NutrError::CameraUnavailable(e.to_string()))?;

        log::debug!("📷 {} camera ready: {}x{}", self.facing, frame.width(), frame.height());
        self.frame = Some(frame);
        Ok(())
    }

    fn frame(&self) -> NutrResult<RgbImage> {
        if !self.active {
            return Err(NutrError::CameraInactive);
        }
        self.frame
            .clone()
            .ok_or_else(|| NutrError::CaptureFailed("camera stream is not ready".to_string()))
    }

    fn stop(&mut self) {
        if self.active {
            log::debug!("⏹️ Stopping {} camera", self.facing);
        }
        self.active = false;
        self.frame = None;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn facing(&self) -> FacingMode {
        self.facing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn write_png(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        RgbImage::from_pixel(4, 3, Rgb([200, 120, 40])).save(&path).unwrap();
        path
    }

    #[test]
    fn test_encode_jpeg_produces_jpeg() {
        let frame = RgbImage::from_pixel(8, 8, Rgb([10, 200, 30]));
        let bytes = encode_jpeg(&frame).unwrap();

        assert!(bytes.starts_with(&[0xff, 0xd8, 0xff]));
    }

    #[tokio::test]
    async fn test_file_camera_serves_frames() {
        let dir = tempfile::tempdir().unwrap();
        let back = write_png(&dir, "back.png");
        let camera = FileCamera::new(None, Some(back));

        let mut stream = camera.open(FacingMode::Environment).await.unwrap();
        stream.ready().await.unwrap();
        let frame = stream.frame().unwrap();

        assert_eq!((frame.width(), frame.height()), (4, 3));
        assert_eq!(stream.facing(), FacingMode::Environment);
    }

    #[tokio::test]
    async fn test_missing_source_is_unavailable() {
        let camera = FileCamera::new(None, None);
        let result = camera.open(FacingMode::User).await;

        assert!(matches!(result, Err(NutrError::CameraUnavailable(_))));
    }

    #[tokio::test]
    async fn test_stopped_stream_yields_no_frames() {
        let dir = tempfile::tempdir().unwrap();
        let front = write_png(&dir, "front.png");
        let camera = FileCamera::new(Some(front), None);

        let mut stream = camera.open(FacingMode::User).await.unwrap();
        stream.ready().await.unwrap();
        stream.stop();
        stream.stop();

        assert!(!stream.is_active());
        assert!(matches!(stream.frame(), Err(NutrError::CameraInactive)));
    }
}
