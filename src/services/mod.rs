pub mod analysis; // Nutrition-analysis backend
pub mod camera;
pub mod identity; // Sign-in provider

pub use analysis::{HttpAnalysisClient, ImagePayload, NutritionAnalyzer};
pub use camera::{CameraDevice, FileCamera, VideoStream};
pub use identity::{HttpIdentityProvider, IdentityConfig, IdentityProvider};
