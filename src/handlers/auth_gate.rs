use crate::error::{NutrError, NutrResult};
use crate::handlers::CaptureFlow;
use crate::models::Session;
use crate::services::{IdentityConfig, IdentityProvider};

/// Holds the current session and keeps the capture flow behind it.
pub struct AuthGate {
    provider: Box<dyn IdentityProvider>,
    session: Option<Session>,
    init_error: Option<String>,
    error: Option<String>,
}

impl AuthGate {
    pub fn new(provider: Box<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            session: None,
            init_error: None,
            error: None,
        }
    }

    /// Runs once at startup. A failure here disables sign-in for the whole run.
    pub async fn init(&mut self, config: IdentityConfig) -> bool {
        match self.provider.init(config).await {
            Ok(()) => {
                self.init_error = None;
                true
            }
            Err(e) => {
                log::error!("✗ Failed to initialize identity provider: {}", e);
                self.init_error = Some(e.to_string());
                false
            }
        }
    }

    pub async fn sign_in(&mut self) -> bool {
        if self.init_error.is_some() {
            self.error = Some(NutrError::AuthNotReady.to_string());
            return false;
        }

        self.error = None;
        match self.provider.sign_in().await.and_then(|user| user.ok_or(NutrError::NoUserData)) {
            Ok(user) => {
                log::info!("✓ Successfully signed in: {}", user.display_name());
                self.session = Some(Session::new(user));
                true
            }
            Err(e) => {
                log::error!("✗ Sign in failed: {}", e);
                self.error = Some(e.to_string());
                false
            }
        }
    }

    /// Local only: drops the session and everything the user was working on.
    pub fn logout(&mut self, flow: &mut CaptureFlow) {
        if let Some(session) = self.session.take() {
            log::info!("👋 {} signed out", session.user.display_name());
        }
        self.error = None;
        flow.reset();
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn require_session(&self) -> NutrResult<&Session> {
        self.session.as_ref().ok_or(NutrError::NotSignedIn)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn init_error(&self) -> Option<&str> {
        self.init_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handlers::capture_flow::tests::{MockAnalyzer, MockCamera};
    use crate::models::UserProfile;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockProvider {
        fail_init: bool,
        user: Option<UserProfile>,
        sign_in_calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl IdentityProvider for MockProvider {
        async fn init(&mut self, _config: IdentityConfig) -> NutrResult<()> {
            if self.fail_init {
                return Err(NutrError::AuthInit("sdk missing".to_string()));
            }
            Ok(())
        }

        async fn sign_in(&self) -> NutrResult<Option<UserProfile>> {
            self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.user.clone())
        }
    }

    fn identity_config() -> IdentityConfig {
        IdentityConfig {
            backend_url: "https://id.example.com".to_string(),
            app_origin: "http://localhost".to_string(),
            app_name: "NutrAI".to_string(),
        }
    }

    fn ada() -> UserProfile {
        serde_json::from_value(serde_json::json!({ "name": "Ada", "email": "ada@example.com" })).unwrap()
    }

    fn gate(fail_init: bool, user: Option<UserProfile>) -> (AuthGate, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = MockProvider {
            fail_init,
            user,
            sign_in_calls: calls.clone(),
        };
        (AuthGate::new(Box::new(provider)), calls)
    }

    #[tokio::test]
    async fn test_sign_in_creates_session() {
        let (mut gate, _) = gate(false, Some(ada()));
        assert!(gate.init(identity_config()).await);

        assert!(gate.sign_in().await);

        let session = gate.require_session().unwrap();
        assert_eq!(session.user.email.as_deref(), Some("ada@example.com"));
        assert!(gate.error().is_none());
    }

    #[tokio::test]
    async fn test_init_failure_disables_sign_in() {
        let (mut gate, calls) = gate(true, Some(ada()));
        assert!(!gate.init(identity_config()).await);
        assert!(gate.init_error().is_some());

        assert!(!gate.sign_in().await);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(gate.error(), Some(NutrError::AuthNotReady.to_string().as_str()));
        assert!(gate.session().is_none());
    }

    #[tokio::test]
    async fn test_missing_user_data_is_an_error() {
        let (mut gate, _) = gate(false, None);
        gate.init(identity_config()).await;

        assert!(!gate.sign_in().await);
        assert_eq!(gate.error(), Some("No user data returned from sign in"));
        assert!(matches!(gate.require_session(), Err(NutrError::NotSignedIn)));
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_flow() {
        let (mut gate, _) = gate(false, Some(ada()));
        gate.init(identity_config()).await;
        gate.sign_in().await;

        let config = Config {
            api_key: "key".to_string(),
            backend_url: "http://backend".to_string(),
            ..Config::default()
        };
        let mut flow = CaptureFlow::new(
            &config,
            MockAnalyzer::returning(Ok(Default::default())),
            Arc::new(MockCamera::default()),
        );
        flow.acquire_url("https://example.com/food.png").await;
        flow.submit().await;

        gate.logout(&mut flow);

        assert!(gate.session().is_none());
        assert!(flow.image().is_none());
        assert!(flow.result().is_none());
    }
}
