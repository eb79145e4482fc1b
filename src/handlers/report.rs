use crate::handlers::{AuthGate, CaptureFlow};
use crate::models::{AnalysisResult, NumberLike};

/// Renders the result as text cards, one per field the backend sent.
pub fn format_analysis_report(result: &AnalysisResult) -> String {
    let mut cards = Vec::new();

    if let Some(calories) = result.calories() {
        cards.push(format!("🔥 *Estimated Calories*\n{}", calories));
    }

    if let Some(items) = result.items() {
        cards.push(format!("🍽️ *Food Items*\n{}", items));
    }

    let macros = format_macros(result);
    if !macros.is_empty() {
        cards.push(macros);
    }

    if let Some(vitamins) = result.vitamins() {
        cards.push(format!("💊 *Vitamins & Minerals*\n{}", vitamins));
    }

    // Markdown is passed through as-is
    if let Some(summary) = result.summary() {
        cards.push(format!("📝 *Analysis*\n{}", summary));
    }

    if cards.is_empty() {
        return "📊 *Nutrition Analysis*\n\nNo nutrition details were returned.".to_string();
    }

    format!("📊 *Nutrition Analysis*\n\n{}", cards.join("\n\n"))
}

fn format_macros(result: &AnalysisResult) -> String {
    let rows: Vec<String> = [
        ("🥩 Protein", result.protein()),
        ("🍞 Carbs", result.carbs()),
        ("🧈 Fat", result.fat()),
        ("🥦 Fiber", result.fiber()),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|v| format!("{}: {}", label, grams(v))))
    .collect();

    rows.join("\n")
}

fn grams(value: &NumberLike) -> String {
    match value {
        NumberLike::Text(s) if s.trim().ends_with('g') => s.trim().to_string(),
        other => format!("{}g", other),
    }
}

/// One-line screen status shown before each prompt.
pub fn format_status(gate: &AuthGate, flow: &CaptureFlow) -> String {
    let user = gate
        .session()
        .map(|s| format!("👤 {}", s.user.display_name()))
        .unwrap_or_else(|| "👤 signed out".to_string());

    let user = if gate.session().is_none() && gate.init_error().is_some() {
        "👤 sign-in unavailable".to_string()
    } else {
        user
    };

    let image = if flow.can_submit() {
        "🖼️ image ready"
    } else if flow.image().is_some() {
        "🖼️ image loaded"
    } else {
        "🖼️ no image"
    };

    let camera = if flow.camera_active() {
        format!("🎥 {} camera on", flow.facing())
    } else {
        format!("🎥 off ({})", flow.facing())
    };

    let mut status = format!("{} | {} | {}", user, image, camera);
    if flow.is_loading() {
        status.push_str(" | ⏳ analyzing...");
    }
    if let Some(error) = flow.error().or(gate.error()) {
        status.push_str(&format!("\n⚠️ {}", error));
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(json: serde_json::Value) -> AnalysisResult {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_only_present_fields_are_rendered() {
        let report = format_analysis_report(&result(serde_json::json!({ "calories": 450 })));

        assert!(report.contains("Estimated Calories*\n450"));
        assert!(!report.contains("Food Items"));
        assert!(!report.contains("Protein"));
        assert!(!report.contains("Vitamins"));
        assert!(!report.contains("📝"));
    }

    #[test]
    fn test_full_report_order() {
        let report = format_analysis_report(&result(serde_json::json!({
            "calories": "650",
            "items": "Pizza Margherita",
            "protein": 25,
            "carbs": 80,
            "fat": "22g",
            "fiber": 4.5,
            "vitamins": "Vitamin A, Calcium",
            "summary": "## Verdict\n- Moderate portion"
        })));

        let positions: Vec<usize> = ["Calories", "Food Items", "Protein", "Fiber", "Vitamins", "## Verdict"]
            .iter()
            .map(|needle| report.find(needle).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(report.contains("Protein: 25g"));
        assert!(report.contains("Fat: 22g"));
        assert!(report.contains("Fiber: 4.5g"));
    }

    #[test]
    fn test_malformed_field_leaves_other_cards() {
        let report = format_analysis_report(&result(serde_json::json!({
            "calories": 450,
            "items": ["Pizza", "Salad"],
            "protein": { "value": 20 }
        })));

        assert!(report.contains("Estimated Calories*\n450"));
        assert!(report.contains("Food Items*\nPizza, Salad"));
        assert!(!report.contains("Protein"));
    }

    #[test]
    fn test_macros_render_individually() {
        let report = format_analysis_report(&result(serde_json::json!({ "protein": 10 })));

        assert!(report.contains("Protein: 10g"));
        assert!(!report.contains("Carbs"));
    }

    #[test]
    fn test_empty_result_has_placeholder() {
        let report = format_analysis_report(&AnalysisResult::default());
        assert!(report.contains("No nutrition details"));
    }
}
