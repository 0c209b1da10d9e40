//! End-to-end conversations through the bot.
//!
//! A scripted channel feeds events into `Bot::run` and records every reply;
//! a stub service stands in for the moderation and completion APIs.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::Mutex;
use tokio::time::timeout;

use peb::bot::Bot;
use peb::channels::{
    Channel, ChannelManager, IncomingMessage, MessageStream, OutgoingResponse, StatusUpdate,
};
use peb::error::{ChannelError, LlmError};
use peb::flow::render::{BANNED_CONTENT_MESSAGE, DRAFT_HEADER, ENHANCED_HEADER};
use peb::flow::{Stage, UserInput};
use peb::llm::{ENHANCEMENT_INSTRUCTION, PromptService};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Stub service: flags drafts mentioning "forbidden", echoes the rest.
#[derive(Default)]
struct StubService {
    moderate_calls: AtomicUsize,
    enhance_calls: AtomicUsize,
    last_enhance: Mutex<Option<(String, String, String)>>,
}

#[async_trait]
impl PromptService for StubService {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn moderate(&self, prompt: &str) -> Result<bool, LlmError> {
        self.moderate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(prompt.contains("forbidden"))
    }

    async fn enhance(
        &self,
        instruction: &str,
        prompt: &str,
        enhancement: &str,
    ) -> Result<String, LlmError> {
        self.enhance_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_enhance.lock().await = Some((
            instruction.to_string(),
            prompt.to_string(),
            enhancement.to_string(),
        ));
        Ok("Act as an experienced Excel teacher...".to_string())
    }
}

#[derive(Debug, Clone)]
struct Recorded {
    user: String,
    response: OutgoingResponse,
}

/// Channel that replays a fixed script and records replies and statuses.
struct ScriptedChannel {
    script: Vec<(&'static str, UserInput)>,
    replies: Arc<Mutex<Vec<Recorded>>>,
    statuses: Arc<Mutex<Vec<StatusUpdate>>>,
}

#[async_trait]
impl Channel for ScriptedChannel {
    fn name(&self) -> &str {
        "script"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let msgs: Vec<IncomingMessage> = self
            .script
            .iter()
            .map(|(user, input)| IncomingMessage::new("script", user, input.clone()))
            .collect();
        Ok(Box::pin(stream::iter(msgs)))
    }

    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        self.replies.lock().await.push(Recorded {
            user: msg.user_id.clone(),
            response,
        });
        Ok(())
    }

    async fn send_status(
        &self,
        status: StatusUpdate,
        _metadata: &serde_json::Value,
    ) -> Result<(), ChannelError> {
        self.statuses.lock().await.push(status);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

struct Outcome {
    replies: Vec<Recorded>,
    statuses: Vec<StatusUpdate>,
}

impl Outcome {
    fn for_user(&self, user: &str) -> Vec<&OutgoingResponse> {
        self.replies
            .iter()
            .filter(|r| r.user == user)
            .map(|r| &r.response)
            .collect()
    }
}

/// Run the bot over `script` until the script is exhausted.
async fn run_script(script: Vec<(&'static str, UserInput)>, service: Arc<StubService>) -> Outcome {
    let replies = Arc::new(Mutex::new(Vec::new()));
    let statuses = Arc::new(Mutex::new(Vec::new()));
    let mut channels = ChannelManager::new();
    channels.add(Box::new(ScriptedChannel {
        script,
        replies: Arc::clone(&replies),
        statuses: Arc::clone(&statuses),
    }));

    let bot = Bot::new("test-bot", service, channels, Duration::from_secs(60));
    timeout(TEST_TIMEOUT, bot.run())
        .await
        .expect("bot run timed out")
        .expect("bot run failed");

    let replies = replies.lock().await.clone();
    let statuses = statuses.lock().await.clone();
    Outcome { replies, statuses }
}

fn text(s: &str) -> UserInput {
    UserInput::Text(s.to_string())
}

fn button(s: &str) -> UserInput {
    UserInput::Button(s.to_string())
}

/// The Excel teacher conversation, optional stages mostly skipped.
fn excel_script(user: &'static str, goal: &str) -> Vec<(&'static str, UserInput)> {
    vec![
        (user, UserInput::from_text("/start")),
        (user, text(goal)),
        (user, text("Teacher")),
        (user, text("Teach basics")),
        (user, text("None")),
        (user, button("how")),
        (user, text("Table")),
        (user, button("constraints")),
        (user, button("tool")),
        (user, button("quality")),
        (user, button("openai")),
    ]
}

#[tokio::test]
async fn excel_teacher_conversation_is_enhanced() {
    let service = Arc::new(StubService::default());
    let outcome = run_script(excel_script("ada", "Learn Excel"), Arc::clone(&service)).await;
    let replies = outcome.for_user("ada");
    assert_eq!(replies.len(), 11);

    // Welcome, then one question per stage in traversal order.
    assert!(replies[0].render.messages[0].starts_with("🤖️ Welcome!"));
    for (reply, number) in replies[1..9].iter().zip(["2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣"]) {
        assert!(
            reply.render.messages[0].starts_with(number),
            "expected {number}, got {:?}",
            reply.render.messages[0]
        );
    }

    let draft = &replies[9].render;
    assert_eq!(draft.messages[0], DRAFT_HEADER);
    assert_eq!(
        draft.messages[1],
        "My goal is: Learn Excel\n\
         Assume you are: Teacher\n\
         Your task is to: Teach basics\n\
         The output format is: Table\n"
    );

    let enhanced = &replies[10].render;
    assert_eq!(enhanced.messages[0], ENHANCED_HEADER);
    assert_eq!(enhanced.messages[1], "Act as an experienced Excel teacher...");
    assert_eq!(enhanced.buttons.len(), 1);

    let (instruction, prompt, enhancement) = service.last_enhance.lock().await.clone().unwrap();
    assert_eq!(instruction, ENHANCEMENT_INSTRUCTION);
    assert_eq!(prompt, draft.messages[1]);
    let expected: String = [Stage::How, Stage::Constraints, Stage::Tool, Stage::Quality]
        .iter()
        .map(|s| format!("{}\n", s.skip_suggestion().unwrap()))
        .collect();
    assert_eq!(enhancement, expected);

    assert!(matches!(outcome.statuses.as_slice(), [StatusUpdate::Thinking(_)]));
}

#[tokio::test]
async fn flagged_draft_is_never_enhanced() {
    let service = Arc::new(StubService::default());
    let outcome = run_script(
        excel_script("eve", "Something forbidden"),
        Arc::clone(&service),
    )
    .await;

    let replies = outcome.for_user("eve");
    let last = &replies[replies.len() - 1].render;
    assert_eq!(last.messages, vec![BANNED_CONTENT_MESSAGE]);
    assert_eq!(service.moderate_calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.enhance_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn interleaved_users_do_not_share_answers() {
    let service = Arc::new(StubService::default());
    let ada = excel_script("ada", "Learn Excel");
    let bob = excel_script("bob", "Understand Bayes theorem");
    let script: Vec<_> = ada.into_iter().zip(bob).flat_map(|(a, b)| [a, b]).collect();

    let outcome = run_script(script, Arc::clone(&service)).await;
    let ada_draft = &outcome.for_user("ada")[9].render.messages[1];
    let bob_draft = &outcome.for_user("bob")[9].render.messages[1];
    assert!(ada_draft.starts_with("My goal is: Learn Excel\n"));
    assert!(bob_draft.starts_with("My goal is: Understand Bayes theorem\n"));
    assert_eq!(service.enhance_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn reset_mid_conversation_starts_over() {
    let service = Arc::new(StubService::default());
    let script = vec![
        ("ada", text("hello")),
        ("ada", text("Learn Excel")),
        ("ada", text("Teacher")),
        ("ada", button("start")),
        ("ada", text("Write a book")),
    ];
    let outcome = run_script(script, service).await;
    let replies = outcome.for_user("ada");
    assert_eq!(replies.len(), 5);
    assert!(replies[0].render.messages[0].starts_with("🤖️ Welcome!"));
    assert!(replies[3].render.messages[0].starts_with("🤖️ Welcome!"));
    assert!(replies[4].render.messages[0].starts_with("2️⃣"));
}
