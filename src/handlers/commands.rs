use std::path::PathBuf;

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    Logout,
    Upload(PathBuf),
    Url(String),
    Camera,
    Flip,
    Capture,
    StopCamera,
    Analyze,
    Reset,
    Status,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let word = word.trim_start_matches('/').to_lowercase();

        let command = match word.as_str() {
            "login" | "signin" => Command::Login,
            "logout" | "signout" => Command::Logout,
            "upload" | "file" | "open" if !rest.is_empty() => Command::Upload(PathBuf::from(unquote(rest))),
            "url" | "fetch" if !rest.is_empty() => Command::Url(rest.to_string()),
            "camera" | "cam" => Command::Camera,
            "flip" | "switch" => Command::Flip,
            "capture" | "snap" => Command::Capture,
            "stop" => Command::StopCamera,
            "analyze" | "analyse" => Command::Analyze,
            "reset" | "clear" | "another" => Command::Reset,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        };

        Some(command)
    }

    /// Whether the command touches the capture flow and so needs a session.
    pub fn needs_session(&self) -> bool {
        matches!(
            self,
            Command::Upload(_)
                | Command::Url(_)
                | Command::Camera
                | Command::Flip
                | Command::Capture
                | Command::Analyze
        )
    }
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(s)
}

pub const HELP_TEXT: &str = "🥗 *Nutr AI* - analyze food nutrition from pictures\n\n\
  login              Sign in\n\
  logout             Sign out and clear the screen\n\
  upload <path>      Use an image file\n\
  url <http...>      Use an image from the web\n\
  camera             Start the camera\n\
  flip               Switch between front and back camera\n\
  capture            Take a photo with the camera\n\
  stop               Turn the camera off\n\
  analyze            Analyze the current image\n\
  reset              Clear image and results\n\
  status             Show the current state\n\
  quit               Exit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("login"), Some(Command::Login));
        assert_eq!(Command::parse("  /Analyze "), Some(Command::Analyze));
        assert_eq!(Command::parse("flip"), Some(Command::Flip));
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_parse_upload_path() {
        assert_eq!(
            Command::parse("upload \"/tmp/my lunch.jpg\""),
            Some(Command::Upload(PathBuf::from("/tmp/my lunch.jpg")))
        );
        assert_eq!(
            Command::parse("upload /tmp/a b.png"),
            Some(Command::Upload(PathBuf::from("/tmp/a b.png")))
        );
    }

    #[test]
    fn test_upload_without_path_is_unknown() {
        assert_eq!(Command::parse("upload"), Some(Command::Unknown("upload".to_string())));
    }

    #[test]
    fn test_session_requirement() {
        assert!(Command::Analyze.needs_session());
        assert!(Command::Upload(PathBuf::from("x")).needs_session());
        assert!(!Command::Reset.needs_session());
        assert!(!Command::Login.needs_session());
    }
}
