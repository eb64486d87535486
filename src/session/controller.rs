use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::SessionConfig,
    dashboard::{compute_stats, DashboardStats, StatsOptions},
    engine::{AnalysisEngine, MockEngine},
    error::SubmitError,
    models::{detect_url_media, AnalysisItem, ContextImage, FileInput, MediaType, User},
};

use super::{
    events::SessionEvent,
    quota::{QuotaPolicy, QuotaSnapshot},
    state::SessionState,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

const EVENT_CAPACITY: usize = 64;

/// Handle returned by every submit call. UI callers may drop it; tests and
/// integrators can await settlement through it.
#[derive(Debug)]
pub enum Submission {
    /// Anonymous placeholder shown while waiting for login.
    Deferred { item_id: String },
    /// Charged against quota and handed to the engine.
    Started {
        item_id: String,
        handle: JoinHandle<Option<AnalysisItem>>,
    },
}

impl Submission {
    pub fn item_id(&self) -> &str {
        match self {
            Submission::Deferred { item_id } | Submission::Started { item_id, .. } => item_id,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Submission::Deferred { .. })
    }

    /// The settled snapshot, or `None` for deferred submissions.
    pub async fn settled(self) -> Option<AnalysisItem> {
        match self {
            Submission::Deferred { .. } => None,
            Submission::Started { item_id, handle } => match handle.await {
                Ok(item) => item,
                Err(err) => {
                    log_error!("analysis task for {} did not complete: {}", item_id, err);
                    None
                }
            },
        }
    }
}

/// The single mutator of session state. Cloning shares the same session.
pub struct SessionController<E: AnalysisEngine = MockEngine> {
    state: Arc<Mutex<SessionState>>,
    engine: Arc<E>,
    config: Arc<SessionConfig>,
    events: broadcast::Sender<SessionEvent>,
    auth_prompt: Arc<Mutex<Option<CancellationToken>>>,
}

impl<E: AnalysisEngine> Clone for SessionController<E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            engine: Arc::clone(&self.engine),
            config: Arc::clone(&self.config),
            events: self.events.clone(),
            auth_prompt: Arc::clone(&self.auth_prompt),
        }
    }
}

impl SessionController<MockEngine> {
    /// Session backed by the simulated engine, latency taken from `config`.
    pub fn with_mock_engine(config: SessionConfig) -> Self {
        let engine = MockEngine::new().with_latency(config.engine_latency());
        Self::new(config, engine)
    }
}

impl<E: AnalysisEngine> SessionController<E> {
    pub fn new(config: SessionConfig, engine: E) -> Self {
        let state = SessionState::new(QuotaPolicy::new(config.daily_free), config.history_limit);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            state: Arc::new(Mutex::new(state)),
            engine: Arc::new(engine),
            config: Arc::new(config),
            events,
            auth_prompt: Arc::new(Mutex::new(None)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn submit_file(&self, file: FileInput) -> Result<Submission, SubmitError> {
        let media_type = file.media_type();
        self.submit(file.name, media_type).await
    }

    /// Validation happens before quota or auth are consulted.
    pub async fn submit_url(&self, url: &str) -> Result<Submission, SubmitError> {
        let detected = detect_url_media(url).map_err(|err| {
            log_warn!("rejected URL submission: {}", err);
            err
        })?;
        self.submit(detected.url, detected.media_type).await
    }

    pub async fn submit_context_image(&self, image: ContextImage) -> Result<Submission, SubmitError> {
        self.submit(image.display_name().to_string(), MediaType::Image)
            .await
    }

    async fn submit(&self, name: String, media_type: MediaType) -> Result<Submission, SubmitError> {
        let mut state = self.state.lock().await;

        if !state.is_authenticated() {
            let placeholder = AnalysisItem::placeholder(name, media_type);
            let item_id = placeholder.id().to_string();
            state.begin_deferred(placeholder.clone());
            drop(state);

            log_info!(
                "anonymous {} submission {} held for login",
                media_type.as_str(),
                item_id
            );
            self.emit(SessionEvent::CurrentItemChanged {
                item: Some(placeholder),
            });
            self.schedule_auth_prompt(Some(item_id.clone())).await;
            return Ok(Submission::Deferred { item_id });
        }

        // Admission and the quota charge happen under one lock so concurrent
        // submissions cannot spend the same unit.
        let item = AnalysisItem::pending(name, media_type);
        if let Err(err) = state.begin_analysis(item.clone()) {
            log_warn!("submission refused: {}", err);
            return Err(err.into());
        }
        let quota = state.quota();
        drop(state);

        log_info!(
            "started {} analysis {} ({} remaining)",
            media_type.as_str(),
            item.id(),
            quota.remaining
        );
        self.emit(SessionEvent::CurrentItemChanged {
            item: Some(item.clone()),
        });
        self.emit(SessionEvent::QuotaChanged { quota });

        Ok(self.spawn_analysis(item))
    }

    /// Called by the login flow. Logging in resumes an anonymous placeholder
    /// when `resume_deferred_on_login` is set; the returned error only
    /// concerns that resumption, the user is stored either way.
    pub async fn set_authenticated_user(
        &self,
        user: Option<User>,
    ) -> Result<Option<Submission>, SubmitError> {
        let logged_in = user.is_some();
        if let Some(user) = &user {
            log_info!("user {} authenticated", user.id);
        } else {
            log_info!("session is anonymous");
        }

        let resumed = {
            let mut state = self.state.lock().await;
            state.set_user(user);
            if logged_in {
                state.set_auth_prompt_open(false);
            }

            let placeholder = state.deferred_placeholder().cloned();
            match placeholder {
                Some(placeholder) if logged_in && self.config.resume_deferred_on_login => {
                    match placeholder.promote() {
                        Ok(promoted) => Some(
                            state
                                .begin_analysis(promoted.clone())
                                .map(|_| (promoted, state.quota()))
                                .map_err(|err| (placeholder.id().to_string(), err)),
                        ),
                        Err(err) => {
                            log_error!("cannot resume placeholder {}: {}", placeholder.id(), err);
                            None
                        }
                    }
                }
                _ => None,
            }
        };

        if logged_in {
            self.cancel_auth_prompt().await;
        }

        match resumed {
            None => Ok(None),
            Some(Ok((item, quota))) => {
                log_info!("resumed deferred analysis {}", item.id());
                self.emit(SessionEvent::DeferredResumed {
                    item_id: item.id().to_string(),
                });
                self.emit(SessionEvent::CurrentItemChanged {
                    item: Some(item.clone()),
                });
                self.emit(SessionEvent::QuotaChanged { quota });
                Ok(Some(self.spawn_analysis(item)))
            }
            Some(Err((item_id, err))) => {
                log_warn!("deferred analysis {} not resumed: {}", item_id, err);
                self.emit(SessionEvent::DeferredRejected {
                    item_id,
                    reason: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    pub async fn add_referral_credit(&self) -> QuotaSnapshot {
        let quota = self.state.lock().await.credit_referral();
        log_info!(
            "referral credited: {} credits, {} remaining",
            quota.referral_credits,
            quota.remaining
        );
        self.emit(SessionEvent::QuotaChanged { quota });
        quota
    }

    pub async fn current_item(&self) -> Option<AnalysisItem> {
        self.state.lock().await.current_item().cloned()
    }

    pub async fn history(&self) -> Vec<AnalysisItem> {
        self.state.lock().await.history_snapshot()
    }

    pub async fn quota(&self) -> QuotaSnapshot {
        self.state.lock().await.quota()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.lock().await.user().cloned()
    }

    pub async fn aggregates(&self) -> DashboardStats {
        let history = self.history().await;
        let options = StatsOptions {
            recent_count: self.config.recent_count,
            top_issues_count: self.config.top_issues_count,
        };
        compute_stats(&history, &options)
    }

    /// Hides the detail view. A running analysis still lands in history.
    pub async fn close_current_item(&self) {
        let closed = self.state.lock().await.clear_current_item();
        if closed.is_some() {
            self.emit(SessionEvent::CurrentItemChanged { item: None });
        }
    }

    pub async fn open_history_item(&self, item_id: &str) -> bool {
        let focused = {
            let mut state = self.state.lock().await;
            if state.focus_history_item(item_id) {
                state.current_item().cloned()
            } else {
                None
            }
        };
        match focused {
            Some(item) => {
                self.emit(SessionEvent::CurrentItemChanged { item: Some(item) });
                true
            }
            None => false,
        }
    }

    pub async fn request_auth_prompt(&self) {
        self.state.lock().await.set_auth_prompt_open(true);
        self.emit(SessionEvent::AuthPromptRequested { item_id: None });
    }

    pub async fn dismiss_auth_prompt(&self) {
        self.state.lock().await.set_auth_prompt_open(false);
        self.cancel_auth_prompt().await;
    }

    pub async fn is_auth_prompt_open(&self) -> bool {
        self.state.lock().await.auth_prompt_open()
    }

    /// Session teardown. Pending prompts are dropped; engine calls already
    /// in flight are left to finish.
    pub async fn end_session(&self) {
        self.cancel_auth_prompt().await;
        log_info!("session ended");
    }

    fn spawn_analysis(&self, item: AnalysisItem) -> Submission {
        let state = Arc::clone(&self.state);
        let engine = Arc::clone(&self.engine);
        let events = self.events.clone();
        let item_id = item.id().to_string();

        let handle = tokio::spawn(async move {
            let outcome = engine.analyse(item.media_type()).await;
            if let Err(failure) = &outcome {
                log_warn!("analysis {} failed: {}", item.id(), failure);
            }

            let settled = match item.settle(outcome) {
                Ok(settled) => settled,
                Err(err) => {
                    log_error!("dropping outcome for {}: {}", item.id(), err);
                    return None;
                }
            };

            let evicted = state.lock().await.record_settled(settled.clone());

            match settled.score() {
                Some(score) => log_info!(
                    "analysis {} done: score {:.3}, {} issues",
                    settled.id(),
                    score,
                    settled.issues().map(|issues| issues.len()).unwrap_or(0)
                ),
                None => log_info!("analysis {} recorded as error", settled.id()),
            }
            if evicted > 0 {
                log_debug!("history full, evicted {} oldest entries", evicted);
            }

            let _ = events.send(SessionEvent::CurrentItemChanged {
                item: Some(settled.clone()),
            });
            let _ = events.send(SessionEvent::ItemSettled {
                item: settled.clone(),
            });

            Some(settled)
        });

        Submission::Started { item_id, handle }
    }

    async fn schedule_auth_prompt(&self, item_id: Option<String>) {
        let token = CancellationToken::new();
        if let Some(previous) = self.auth_prompt.lock().await.replace(token.clone()) {
            previous.cancel();
        }

        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let delay = Duration::from_millis(self.config.auth_prompt_delay_ms);

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    {
                        let mut guard = state.lock().await;
                        if guard.is_authenticated() {
                            return;
                        }
                        guard.set_auth_prompt_open(true);
                    }
                    log_info!("raising auth prompt after {}ms", delay.as_millis());
                    let _ = events.send(SessionEvent::AuthPromptRequested { item_id });
                }
                _ = token.cancelled() => {
                    log_debug!("auth prompt cancelled before it fired");
                }
            }
        });
    }

    async fn cancel_auth_prompt(&self) {
        if let Some(token) = self.auth_prompt.lock().await.take() {
            token.cancel();
        }
    }

    fn emit(&self, event: SessionEvent) {
        log_debug!("emitting {}", event.name());
        // No subscribers is fine; presentation may not be attached yet.
        let _ = self.events.send(event);
    }
}
