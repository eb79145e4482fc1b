use thiserror::Error;

/// Every failure the screen can show. The `Display` text is what the user sees.
#[derive(Debug, Error)]
pub enum NutrError {
    // Configuration
    #[error("Please configure your Google AI API key (GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("Please configure your backend URL (BACKEND_URL)")]
    MissingBackendUrl,

    // Input
    #[error("Please upload an image")]
    NoImage,

    #[error("Invalid image data: {0}")]
    InvalidDataUrl(String),

    #[error("Image is too large: {size} bytes exceeds the limit of {limit} bytes")]
    ImageTooLarge { size: u64, limit: u64 },

    #[error("Image file {0} is empty")]
    EmptyFile(String),

    #[error("Could not read image file {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // Device
    #[error("Could not access camera: {0}")]
    CameraUnavailable(String),

    #[error("Camera stream did not become ready in {0} ms")]
    CameraNotReady(u64),

    #[error("Camera is not active")]
    CameraInactive,

    #[error("Failed to capture photo: {0}")]
    CaptureFailed(String),

    // Remote
    #[error("{0}")]
    Remote(String),

    #[error("Analysis failed with status {0}")]
    RemoteStatus(u16),

    #[error("Failed to analyze image: invalid response ({0})")]
    MalformedResponse(String),

    #[error("Failed to analyze image: {0}")]
    Transport(String),

    #[error("Failed to download image: {0}")]
    ImageDownload(String),

    // Authentication
    #[error("Failed to initialize authentication: {0}")]
    AuthInit(String),

    #[error("Authentication system not ready. Please restart and try again.")]
    AuthNotReady,

    #[error("Failed to sign in: {0}")]
    SignIn(String),

    #[error("No user data returned from sign in")]
    NoUserData,

    #[error("Please sign in first")]
    NotSignedIn,
}

impl From<reqwest::Error> for NutrError {
    fn from(err: reqwest::Error) -> Self {
        NutrError::Transport(err.to_string())
    }
}

pub type NutrResult<T> = Result<T, NutrError>;
