use crate::handlers::{format_analysis_report, format_status, AuthGate, CaptureFlow, Command, HELP_TEXT};

/// The single Nutr AI screen: the sign-in gate in front of the capture flow.
pub struct Screen {
    gate: AuthGate,
    flow: CaptureFlow,
    auth_required: bool,
}

impl Screen {
    pub fn new(gate: AuthGate, flow: CaptureFlow, auth_required: bool) -> Self {
        Self {
            gate,
            flow,
            auth_required,
        }
    }

    pub fn status(&self) -> String {
        format_status(&self.gate, &self.flow)
    }

    /// Applies one command and returns the text to show.
    pub async fn handle(&mut self, command: Command) -> String {
        if self.auth_required && command.needs_session() {
            if let Err(e) = self.gate.require_session() {
                return format!("🔒 {}. Type 'login' to continue.", e);
            }
        }

        match command {
            Command::Login => {
                if let Some(session) = self.gate.session() {
                    return format!(
                        "✅ Already signed in as {} (since {})",
                        session.user.display_name(),
                        session.signed_in_at.with_timezone(&chrono::Local).format("%H:%M")
                    );
                }
                if self.gate.sign_in().await {
                    let user = self.gate.session().map(|s| s.user.display_name()).unwrap_or_default();
                    format!("✅ Signed in as {}", user)
                } else {
                    Self::error_text(self.gate.error(), "Failed to sign in")
                }
            }
            Command::Logout => {
                self.gate.logout(&mut self.flow);
                "👋 Signed out".to_string()
            }
            Command::Upload(path) => {
                if self.flow.acquire_file(&path).await {
                    format!("🖼️ Image loaded from {}. Type 'analyze' to continue.", path.display())
                } else {
                    Self::error_text(self.flow.error(), "Failed to load image")
                }
            }
            Command::Url(url) => {
                if self.flow.acquire_url(&url).await {
                    "🖼️ Image downloaded. Type 'analyze' to continue.".to_string()
                } else {
                    Self::error_text(self.flow.error(), "Failed to download image")
                }
            }
            Command::Camera => {
                if self.flow.start_camera().await {
                    format!("🎥 {} camera on. Type 'capture' to take a photo.", self.flow.facing())
                } else {
                    Self::error_text(self.flow.error(), "Failed to start camera")
                }
            }
            Command::Flip => {
                if self.flow.switch_facing().await {
                    format!("🔄 Using the {} camera", self.flow.facing())
                } else {
                    Self::error_text(self.flow.error(), "Failed to switch camera")
                }
            }
            Command::Capture => {
                if self.flow.capture() {
                    "📸 Photo captured. Type 'analyze' to continue.".to_string()
                } else {
                    Self::error_text(self.flow.error(), "Failed to capture photo")
                }
            }
            Command::StopCamera => {
                self.flow.stop_camera();
                "⏹️ Camera off".to_string()
            }
            Command::Analyze => {
                if self.flow.submit().await {
                    match self.flow.result() {
                        Some(result) => format_analysis_report(result),
                        None => "📊 No nutrition details were returned.".to_string(),
                    }
                } else {
                    Self::error_text(self.flow.error(), "Failed to analyze image")
                }
            }
            Command::Reset => {
                self.flow.reset();
                "🧹 Cleared. Upload or capture another image.".to_string()
            }
            Command::Status => self.status(),
            Command::Help => HELP_TEXT.to_string(),
            Command::Quit => "🛑 Bye".to_string(),
            Command::Unknown(line) => format!("❓ Unknown command '{}'. Type 'help' for the list.", line),
        }
    }

    pub fn shutdown(&mut self) {
        self.flow.stop_camera();
    }

    fn error_text(error: Option<&str>, fallback: &str) -> String {
        format!("⚠️ {}", error.unwrap_or(fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::NutrResult;
    use crate::handlers::capture_flow::tests::{MockAnalyzer, MockCamera};
    use crate::models::{AnalysisResult, UserProfile};
    use crate::services::{IdentityConfig, IdentityProvider};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    struct AlwaysAda;

    #[async_trait::async_trait]
    impl IdentityProvider for AlwaysAda {
        async fn init(&mut self, _config: IdentityConfig) -> NutrResult<()> {
            Ok(())
        }

        async fn sign_in(&self) -> NutrResult<Option<UserProfile>> {
            Ok(Some(serde_json::from_value(serde_json::json!({ "name": "Ada" })).unwrap()))
        }
    }

    fn screen(auth_required: bool, analyzer: Arc<MockAnalyzer>) -> Screen {
        let config = Config {
            api_key: "key".to_string(),
            backend_url: "http://backend".to_string(),
            ..Config::default()
        };
        let flow = CaptureFlow::new(&config, analyzer, Arc::new(MockCamera::default()));
        Screen::new(AuthGate::new(Box::new(AlwaysAda)), flow, auth_required)
    }

    fn calories_only() -> AnalysisResult {
        serde_json::from_value(serde_json::json!({ "calories": 450 })).unwrap()
    }

    #[tokio::test]
    async fn test_capture_commands_need_session() {
        let analyzer = MockAnalyzer::returning(Ok(calories_only()));
        let mut screen = screen(true, analyzer.clone());

        let output = screen.handle(Command::Analyze).await;

        assert!(output.contains("Please sign in first"));
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sign_in_then_analyze() {
        let analyzer = MockAnalyzer::returning(Ok(calories_only()));
        let mut screen = screen(true, analyzer.clone());

        assert!(screen.handle(Command::Login).await.contains("Signed in as Ada"));
        screen.handle(Command::Url("https://example.com/food.png".to_string())).await;
        let report = screen.handle(Command::Analyze).await;

        assert!(report.contains("Estimated Calories"));
        assert!(!report.contains("Food Items"));
        assert!(screen.status().contains("Ada"));
    }

    #[tokio::test]
    async fn test_analyze_without_image_shows_error() {
        let mut screen = screen(false, MockAnalyzer::returning(Ok(calories_only())));

        let output = screen.handle(Command::Analyze).await;

        assert_eq!(output, "⚠️ Please upload an image");
    }

    #[tokio::test]
    async fn test_camera_flow_from_prompt() {
        let mut screen = screen(false, MockAnalyzer::returning(Ok(calories_only())));

        assert!(screen.handle(Command::Camera).await.contains("back camera on"));
        assert!(screen.handle(Command::Flip).await.contains("front"));
        assert!(screen.handle(Command::Capture).await.contains("Photo captured"));
        assert!(screen.status().contains("image ready"));
    }
}
