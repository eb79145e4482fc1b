mod config;
mod error;
mod handlers;
mod models;
mod services;

use anyhow::Result;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use config::Config;
use handlers::{AuthGate, CaptureFlow, Command, Screen, HELP_TEXT};
use services::{FileCamera, HttpAnalysisClient, HttpIdentityProvider, IdentityConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    log::info!("🚀 Starting Nutr AI...");

    // Load configuration (.env is read here as well)
    let config = Config::from_env();

    let analyzer = Arc::new(HttpAnalysisClient::new());
    log::info!("✅ Analysis client initialized (backend: {})", display_or_unset(&config.backend_url));

    let camera = Arc::new(FileCamera::new(
        config.camera_front_source.clone(),
        config.camera_back_source.clone(),
    ));

    let mut gate = AuthGate::new(Box::new(HttpIdentityProvider::new()));
    if config.auth_required {
        gate.init(IdentityConfig {
            backend_url: config.id_backend_url.clone(),
            app_origin: config.app_origin.clone(),
            app_name: config.app_name.clone(),
        })
        .await;
    } else {
        log::warn!("⚠️ AUTH_REQUIRED=false, sign-in is skipped");
    }

    let flow = CaptureFlow::new(&config, analyzer, camera);
    let mut screen = Screen::new(gate, flow, config.auth_required);

    println!("\n{}\n", HELP_TEXT);
    println!("{}", screen.status());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("nutr-ai> ");
        std::io::stdout().flush()?;

        let Some(line) = interruptible(lines.next_line(), tokio::signal::ctrl_c()).await else {
            break;
        };
        // EOF
        let Some(line) = line? else { break };

        let Some(command) = Command::parse(&line) else { continue };
        let quit = command == Command::Quit;

        let Some(output) = interruptible(screen.handle(command), tokio::signal::ctrl_c()).await else {
            log::warn!("⚠️ Interrupted");
            break;
        };
        println!("{}\n", output);

        if quit {
            break;
        }
    }

    log::info!("🛑 Shutting down...");
    screen.shutdown();

    Ok(())
}

/// Runs `work` unless `interrupt` fires first, in which case `work` is dropped.
async fn interruptible<F, I>(work: F, interrupt: I) -> Option<F::Output>
where
    F: Future,
    I: Future,
{
    tokio::select! {
        biased;
        _ = interrupt => None,
        output = work => Some(output),
    }
}

fn display_or_unset(value: &str) -> &str {
    if value.trim().is_empty() {
        "<unset>"
    } else {
        value
    }
}
