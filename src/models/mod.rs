mod data_url;

pub use data_url::{sniff_mime, DataUrl};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A JSON value the backend may send either as a number or as a string ("450", "12.5").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberLike {
    Number(serde_json::Number),
    Text(String),
}

impl NumberLike {
    fn is_blank(&self) -> bool {
        matches!(self, NumberLike::Text(s) if s.trim().is_empty())
    }
}

impl std::fmt::Display for NumberLike {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberLike::Number(n) => write!(f, "{}", n),
            NumberLike::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

/// Response of `POST /analyze-food`. Every field is optional, and a field with
/// an unexpected JSON type is dropped instead of failing the whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub calories: Option<NumberLike>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub items: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub protein: Option<NumberLike>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub carbs: Option<NumberLike>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub fat: Option<NumberLike>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub fiber: Option<NumberLike>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub vitamins: Option<String>,
    /// Markdown
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl AnalysisResult {
    // Blank strings count as absent, same as a missing key or null.
    pub fn calories(&self) -> Option<&NumberLike> {
        present_number(&self.calories)
    }

    pub fn items(&self) -> Option<&str> {
        present_text(&self.items)
    }

    pub fn protein(&self) -> Option<&NumberLike> {
        present_number(&self.protein)
    }

    pub fn carbs(&self) -> Option<&NumberLike> {
        present_number(&self.carbs)
    }

    pub fn fat(&self) -> Option<&NumberLike> {
        present_number(&self.fat)
    }

    pub fn fiber(&self) -> Option<&NumberLike> {
        present_number(&self.fiber)
    }

    pub fn vitamins(&self) -> Option<&str> {
        present_text(&self.vitamins)
    }

    pub fn summary(&self) -> Option<&str> {
        present_text(&self.summary)
    }
}

fn present_number(value: &Option<NumberLike>) -> Option<&NumberLike> {
    value.as_ref().filter(|v| !v.is_blank())
}

fn present_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<NumberLike>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => Some(NumberLike::Number(n)),
        Some(Value::String(s)) => Some(NumberLike::Text(s)),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(text_of))
}

// Lists such as ["Pizza", "Salad"] are joined for display
fn text_of(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(values) => {
            let parts: Vec<String> = values
                .into_iter()
                .filter_map(text_of)
                .filter(|s| !s.trim().is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

/// User record returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("Signed-in user")
    }
}

/// An authenticated identity. Lives in memory only.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserProfile,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: UserProfile) -> Self {
        Self {
            user,
            signed_in_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera
    User,
    /// Back camera
    #[default]
    Environment,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FacingMode::User => "front",
            FacingMode::Environment => "back",
        };
        write!(f, "{}", s)
    }
}
