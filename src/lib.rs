pub mod config;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod models;
pub mod session;
pub mod utils;

use std::time::Duration;

use anyhow::Result;
use log::{info, warn};
use tokio::sync::broadcast::{self, error::RecvError};

pub use config::SessionConfig;
pub use dashboard::DashboardStats;
pub use engine::{AnalysisEngine, MockEngine};
pub use error::{EngineFailure, QuotaExceededError, SubmitError, ValidationError};
pub use models::{AnalysisItem, AnalysisStatus, ContextImage, FileInput, MediaType, User};
pub use session::{SessionController, SessionEvent, Submission};

/// Logs every session event until the session goes away. A slow listener
/// skips ahead instead of stopping. Returns how many events were logged.
async fn log_events(mut events: broadcast::Receiver<SessionEvent>) -> usize {
    let mut seen = 0;
    loop {
        match events.recv().await {
            Ok(event) => {
                info!("event: {}", event.name());
                seen += 1;
            }
            Err(RecvError::Lagged(skipped)) => warn!("event listener skipped {skipped} events"),
            Err(RecvError::Closed) => return seen,
        }
    }
}

/// Scripted walk through one session against the simulated engine: an
/// anonymous upload, login, a few more submissions, then the dashboard.
pub async fn run() -> Result<()> {
    utils::logging::init();

    let config = SessionConfig::from_env()?;
    info!("VeriDAI session starting ({} free analyses)", config.daily_free);

    let prompt_delay = Duration::from_millis(config.auth_prompt_delay_ms);
    let session = SessionController::with_mock_engine(config);
    let listener = tokio::spawn(log_events(session.subscribe()));

    let placeholder = session
        .submit_file(FileInput::new("portrait.jpg", "image/jpeg"))
        .await?;
    info!("anonymous upload held as {}", placeholder.item_id());
    tokio::time::sleep(prompt_delay + Duration::from_millis(50)).await;

    let resumed = session
        .set_authenticated_user(Some(User::new("demo@veridai.app")))
        .await?;
    if let Some(submission) = resumed {
        submission.settled().await;
    }

    let mut pending = Vec::new();
    match session.submit_url("cdn.example.com/media/interview.mp4").await {
        Ok(submission) => pending.push(submission),
        Err(err) => warn!("URL submission refused: {err}"),
    }
    if let Err(err) = session.submit_url("https://example.com/article").await {
        info!("expected rejection: {err}");
    }
    pending.push(
        session
            .submit_context_image(ContextImage::new("image/png"))
            .await?,
    );
    for submission in pending {
        submission.settled().await;
    }

    session.add_referral_credit().await;

    let stats = session.aggregates().await;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    println!("{}", serde_json::to_string_pretty(&session.quota().await)?);

    session.end_session().await;
    drop(session);
    listener.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::QuotaSnapshot;

    fn quota_event(remaining: u32) -> SessionEvent {
        SessionEvent::QuotaChanged {
            quota: QuotaSnapshot {
                remaining,
                referral_credits: 0,
            },
        }
    }

    #[tokio::test]
    async fn event_logger_survives_lag() {
        let (tx, rx) = broadcast::channel(1);
        for remaining in 0..3 {
            tx.send(quota_event(remaining)).unwrap();
        }
        drop(tx);

        // The first two events were overwritten; the last one is still read.
        assert_eq!(log_events(rx).await, 1);
    }
}
