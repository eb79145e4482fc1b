pub mod auth_gate;
pub mod capture_flow;
pub mod commands;
pub mod report;
pub mod screen;

pub use auth_gate::AuthGate;
pub use capture_flow::CaptureFlow;
pub use commands::{Command, HELP_TEXT};
pub use report::{format_analysis_report, format_status};
pub use screen::Screen;
