//! Session router: one sequential event queue per user.
//!
//! Each user key gets its own tokio task that exclusively owns that user's
//! `ConversationState`. Events for one user are handled strictly in arrival
//! order; different users proceed concurrently. A task that sees no event for
//! the idle timeout ends, dropping the state; the next event starts afresh.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bot::session::{respond_to, wants_enhancement};
use crate::channels::{ChannelManager, IncomingMessage, StatusUpdate};
use crate::flow::ConversationState;
use crate::llm::PromptService;

struct SessionHandle {
    tx: mpsc::UnboundedSender<IncomingMessage>,
    task: JoinHandle<()>,
}

/// Routes incoming events to per-user session tasks.
pub struct SessionRouter {
    service: Arc<dyn PromptService>,
    channels: Arc<ChannelManager>,
    idle_timeout: Duration,
    sessions: HashMap<String, SessionHandle>,
}

impl SessionRouter {
    pub fn new(
        service: Arc<dyn PromptService>,
        channels: Arc<ChannelManager>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            service,
            channels,
            idle_timeout,
            sessions: HashMap::new(),
        }
    }

    /// Queue `msg` on its user's session, starting one if needed.
    pub fn dispatch(&mut self, msg: IncomingMessage) {
        let key = msg.session_key();

        let msg = match self.sessions.get(&key) {
            Some(handle) => match handle.tx.send(msg) {
                Ok(()) => return,
                // The session went idle and closed its queue.
                Err(mpsc::error::SendError(msg)) => msg,
            },
            None => msg,
        };

        self.sessions.retain(|_, h| !h.tx.is_closed());

        let handle = self.spawn_session(key.clone());
        if handle.tx.send(msg).is_err() {
            tracing::warn!(session = %key, "New session closed before its first event");
        }
        self.sessions.insert(key, handle);
    }

    /// Number of sessions still accepting events.
    pub fn active_sessions(&self) -> usize {
        self.sessions.values().filter(|h| !h.tx.is_closed()).count()
    }

    /// Stop accepting events and wait for every session to finish its queue.
    pub async fn shutdown(self) {
        let tasks: Vec<JoinHandle<()>> = self
            .sessions
            .into_values()
            .map(|SessionHandle { tx, task }| {
                drop(tx);
                task
            })
            .collect();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!("Session task failed: {}", e);
            }
        }
    }

    fn spawn_session(&self, key: String) -> SessionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        tracing::debug!(session = %key, "Session started");
        let task = tokio::spawn(run_session(
            key,
            rx,
            Arc::clone(&self.service),
            Arc::clone(&self.channels),
            self.idle_timeout,
        ));
        SessionHandle { tx, task }
    }
}

async fn run_session(
    key: String,
    mut rx: mpsc::UnboundedReceiver<IncomingMessage>,
    service: Arc<dyn PromptService>,
    channels: Arc<ChannelManager>,
    idle_timeout: Duration,
) {
    let mut state = ConversationState::new();

    loop {
        match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(msg)) => handle_event(&mut state, msg, service.as_ref(), &channels).await,
            Ok(None) => break,
            Err(_) => {
                // Refuse new events, then finish the ones already queued.
                rx.close();
                while let Ok(msg) = rx.try_recv() {
                    handle_event(&mut state, msg, service.as_ref(), &channels).await;
                }
                tracing::debug!(session = %key, "Session idle, state dropped");
                break;
            }
        }
    }
}

async fn handle_event(
    state: &mut ConversationState,
    msg: IncomingMessage,
    service: &dyn PromptService,
    channels: &ChannelManager,
) {
    tracing::debug!(
        "Received {:?} from {} on {} at stage {}",
        msg.input,
        msg.user_id,
        msg.channel,
        state.current_stage
    );

    if wants_enhancement(state, &msg.input) {
        if let Err(e) = channels
            .send_status(
                &msg,
                StatusUpdate::Thinking("Perfecting your prompt...".into()),
            )
            .await
        {
            tracing::debug!(channel = %msg.channel, "Failed to send status: {}", e);
        }
    }

    let render = respond_to(state, &msg.input, service).await;
    if render.is_empty() {
        return;
    }
    if let Err(e) = channels.respond(&msg, render.into()).await {
        tracing::warn!(channel = %msg.channel, "Failed to deliver reply: {}", e);
    }
}
