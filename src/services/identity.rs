use serde::Serialize;

use crate::error::{NutrError, NutrResult};
use crate::models::UserProfile;

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub backend_url: String,
    pub app_origin: String,
    pub app_name: String,
}

/// Third-party sign-in. Sign-out is local and never reaches the provider.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn init(&mut self, config: IdentityConfig) -> NutrResult<()>;

    /// Returns the signed-in user, or `None` when the provider gave back nothing.
    async fn sign_in(&self) -> NutrResult<Option<UserProfile>>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    app_origin: &'a str,
    app_name: &'a str,
}

/// Identity backend reached over HTTP.
pub struct HttpIdentityProvider {
    config: Option<IdentityConfig>,
    client: reqwest::Client,
}

impl HttpIdentityProvider {
    pub fn new() -> Self {
        Self {
            config: None,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(backend_url: &str, path: &str) -> String {
        format!("{}{}", backend_url.trim_end_matches('/'), path)
    }
}

impl Default for HttpIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn init(&mut self, config: IdentityConfig) -> NutrResult<()> {
        log::info!("🔐 Initializing identity provider with backend: {}", config.backend_url);

        let backend = reqwest::Url::parse(config.backend_url.trim())
            .map_err(|e| NutrError::AuthInit(format!("invalid backend URL '{}': {}", config.backend_url, e)))?;
        if !matches!(backend.scheme(), "http" | "https") {
            return Err(NutrError::AuthInit(format!("unsupported backend scheme '{}'", backend.scheme())));
        }
        if config.app_name.trim().is_empty() {
            return Err(NutrError::AuthInit("app name is required".to_string()));
        }

        self.config = Some(IdentityConfig {
            backend_url: config.backend_url.trim().to_string(),
            ..config
        });
        log::info!("✅ Identity provider initialized");
        Ok(())
    }

    async fn sign_in(&self) -> NutrResult<Option<UserProfile>> {
        let config = self.config.as_ref().ok_or(NutrError::AuthNotReady)?;
        let url = Self::api_url(&config.backend_url, "/api/sign-in");

        log::info!("🔑 Starting sign in via {}", url);

        let response = self
            .client
            .post(&url)
            .header("Origin", &config.app_origin)
            .json(&SignInRequest {
                app_origin: &config.app_origin,
                app_name: &config.app_name,
            })
            .send()
            .await
            .map_err(|e| NutrError::SignIn(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| NutrError::SignIn(e.to_string()))?;

        if !status.is_success() {
            log::error!("❌ Sign in failed ({}): {}", status, body);
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| format!("identity backend returned status {}", status.as_u16()));
            return Err(NutrError::SignIn(message));
        }

        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(None);
        }

        let user: UserProfile = serde_json::from_str(&body).map_err(|e| NutrError::SignIn(e.to_string()))?;
        log::info!("✅ Signed in as {}", user.display_name());
        Ok(Some(user))
    }
}
