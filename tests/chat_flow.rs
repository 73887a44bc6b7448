//! End-to-end behaviour of the read loop, driven with a scripted reader, an
//! in-memory writer and local response sources. No network, no terminal.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use agent_cli::agent::mock::{Bucket, MockSource};
use agent_cli::agent::{
    AgentError, AgentEvent, AgentEvents, AgentService, RemoteSource, ResponseSource, SessionHandle,
};
use agent_cli::chat::{ChatOptions, ChatSession, LineReader, Outcome, ReadOutcome, SessionEnd};
use agent_cli::config::MockConfig;
use agent_cli::history::HistoryFile;
use agent_cli::message::Role;
use agent_cli::storage::{SessionState, SessionStore};
use async_trait::async_trait;
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

struct Script {
    lines: VecDeque<ReadOutcome>,
}

impl Script {
    fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| ReadOutcome::Line(l.to_string())).collect(),
        }
    }
}

impl LineReader for Script {
    fn read_line(&mut self, _prompt: &str) -> anyhow::Result<ReadOutcome> {
        Ok(self.lines.pop_front().unwrap_or(ReadOutcome::Eof))
    }
}

fn quiet_mock(seed: u64) -> Box<dyn ResponseSource> {
    Box::new(MockSource::new(
        "MockBot",
        &MockConfig {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            tool_call_probability: 0.0,
            seed: Some(seed),
        },
    ))
}

fn session(
    dir: &TempDir,
    lines: &[&str],
    source: Box<dyn ResponseSource>,
) -> ChatSession<Script, Vec<u8>> {
    colored::control::set_override(false);
    ChatSession::new(
        Script::new(lines),
        Vec::new(),
        source,
        HistoryFile::new(dir.path().join("chat_history")),
        SessionStore::new(dir.path().join("session.json")),
        ChatOptions {
            width: Some(72),
            max_width: 100,
            history_recent: 10,
            spinner: false,
        },
    )
}

fn output(session: &ChatSession<Script, Vec<u8>>) -> String {
    String::from_utf8_lossy(session.output()).to_string()
}

fn history_lines(dir: &TempDir) -> Vec<String> {
    HistoryFile::new(dir.path().join("chat_history")).load().unwrap()
}

/// Agent service that fails the first `failures` posts, then answers.
struct FlakyService {
    failures: usize,
    /// Turns already on the thread when the session opens.
    earlier: Vec<AgentEvent>,
    /// Set when `end_session` ran while a call was marked in flight.
    ended_in_flight: Arc<AtomicBool>,
}

impl FlakyService {
    fn new(failures: usize) -> Self {
        Self {
            failures,
            earlier: Vec::new(),
            ended_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl AgentService for FlakyService {
    fn kind(&self) -> &'static str {
        "flaky"
    }

    async fn create_or_reuse_session(&mut self, name: &str) -> Result<SessionHandle, AgentError> {
        Ok(SessionHandle {
            agent_id: "asst_test".to_string(),
            agent_name: name.to_string(),
            thread_id: "thread_test".to_string(),
        })
    }

    async fn post_message(
        &mut self,
        _session: &SessionHandle,
        text: &str,
    ) -> Result<AgentEvents, AgentError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(AgentError::Connection("connection refused".to_string()));
        }
        Ok(AgentEvents::new(vec![
            AgentEvent::ToolCall {
                tool: "bing_grounding (completed)".to_string(),
                detail: "https://www.bing.com/search?q=rust".to_string(),
            },
            AgentEvent::AssistantText {
                text: format!("You asked: {}", text),
            },
        ]))
    }

    async fn conversation(&mut self, _session: &SessionHandle) -> Result<AgentEvents, AgentError> {
        Ok(AgentEvents::new(std::mem::take(&mut self.earlier)))
    }

    async fn end_session(&mut self, _session: &SessionHandle) -> Result<(), AgentError> {
        if agent_cli::interrupt::in_flight() {
            self.ended_in_flight.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}

// ============================================================================
// Commands
// ============================================================================

#[tokio::test]
async fn exit_appends_nothing() {
    let dir = TempDir::new().unwrap();
    let mut chat = session(&dir, &["exit"], quiet_mock(1));

    assert_eq!(chat.run().await.unwrap(), SessionEnd::ExitCommand);
    assert!(chat.transcript().is_empty());
    assert!(history_lines(&dir).is_empty());
}

#[tokio::test]
async fn keywords_in_any_case_never_become_messages() {
    let dir = TempDir::new().unwrap();
    let mut chat = session(&dir, &[], quiet_mock(1));

    for line in ["HELP", "  history  ", "Status", "\tclear\n"] {
        assert_eq!(chat.handle_line(line).await.unwrap(), Outcome::Continue);
    }
    assert!(chat.transcript().is_empty());
    assert!(history_lines(&dir).is_empty());
}

#[tokio::test]
async fn blank_input_reprompts_silently() {
    let dir = TempDir::new().unwrap();
    let mut chat = session(&dir, &[], quiet_mock(1));

    for line in ["", "   ", "\t"] {
        assert_eq!(chat.handle_line(line).await.unwrap(), Outcome::Continue);
    }
    assert!(output(&chat).is_empty());
    assert!(chat.transcript().is_empty());
    assert!(history_lines(&dir).is_empty());
}

#[tokio::test]
async fn clear_resets_transcript_and_session_state() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::new(dir.path().join("session.json"));
    store
        .save(&SessionState {
            thread_id: Some("thread_old".to_string()),
            ..Default::default()
        })
        .unwrap();

    let mut chat = session(&dir, &[], quiet_mock(1));
    chat.handle_line("hello").await.unwrap();
    assert!(!chat.transcript().is_empty());

    chat.handle_line("clear").await.unwrap();
    assert!(chat.transcript().is_empty());
    assert_eq!(store.load(), SessionState::default());
    // Input history is not part of the conversation.
    assert_eq!(history_lines(&dir), vec!["hello"]);
}

#[tokio::test]
async fn help_replays_recent_messages() {
    let dir = TempDir::new().unwrap();
    let mut chat = session(&dir, &[], quiet_mock(3));
    for i in 0..5 {
        chat.handle_line(&format!("question number {}", i)).await.unwrap();
    }
    assert_eq!(chat.transcript().len(), 10);

    let before = output(&chat).len();
    chat.handle_line("help").await.unwrap();
    let replay = &output(&chat)[before..];

    assert!(replay.contains("Welcome to Agent CLI"));
    assert!(!replay.contains("question number 1"));
    assert!(replay.contains("question number 2"));
    assert!(replay.contains("question number 4"));
    assert_eq!(chat.transcript().len(), 10);
}

#[tokio::test]
async fn clear_ends_the_remote_session_as_an_interruptible_call() {
    let dir = TempDir::new().unwrap();
    let service = FlakyService::new(0);
    let ended_in_flight = Arc::clone(&service.ended_in_flight);
    let mut chat = session(&dir, &[], Box::new(RemoteSource::new("Helper", service)));

    chat.handle_line("open the thread").await.unwrap();
    chat.handle_line("clear").await.unwrap();

    assert!(ended_in_flight.load(Ordering::SeqCst));
    assert!(chat.transcript().is_empty());
}

#[tokio::test]
async fn resumed_thread_restores_earlier_turns_before_the_new_one() {
    let dir = TempDir::new().unwrap();
    let mut service = FlakyService::new(0);
    service.earlier = vec![
        AgentEvent::AssistantText {
            text: "Earlier answer about lifetimes".to_string(),
        },
        AgentEvent::AssistantText {
            text: "I encountered an error: quota exhausted".to_string(),
        },
    ];
    let mut chat = session(&dir, &[], Box::new(RemoteSource::new("Helper", service)));

    chat.handle_line("and borrowing?").await.unwrap();

    let contents: Vec<&str> = chat.transcript().iter().map(|m| m.content()).collect();
    assert_eq!(contents.len(), 5);
    assert_eq!(contents[0], "Earlier answer about lifetimes");
    assert_eq!(contents[2], "and borrowing?");
    assert_eq!(contents[4], "You asked: and borrowing?");
    assert!(output(&chat).contains("Restored 2 earlier messages"));

    chat.handle_line("status").await.unwrap();
    assert!(output(&chat).contains("Conversation length: 5 messages"));

    // Later turns do not restore again.
    chat.handle_line("one more").await.unwrap();
    assert_eq!(chat.transcript().len(), 8);
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn history_file_keeps_submissions_in_order() {
    let dir = TempDir::new().unwrap();
    let inputs = ["first message", "  second, with padding  ", "third"];
    let mut chat = session(&dir, &inputs, quiet_mock(5));

    assert_eq!(chat.run().await.unwrap(), SessionEnd::EndOfInput);
    assert_eq!(history_lines(&dir), inputs.to_vec());
}

#[tokio::test]
async fn history_command_after_restart_is_chronological() {
    let dir = TempDir::new().unwrap();
    let inputs: Vec<String> = (1..=12).map(|i| format!("entry {}", i)).collect();
    let refs: Vec<&str> = inputs.iter().map(String::as_str).collect();

    let mut first = session(&dir, &refs, quiet_mock(7));
    first.run().await.unwrap();
    drop(first);

    let mut second = session(&dir, &[], quiet_mock(7));
    second.handle_line("history").await.unwrap();
    let out = output(&second);

    assert!(!out.contains("entry 2 "));
    let positions: Vec<usize> = (3..=12)
        .map(|i| {
            out.find(&format!("{}. entry {}", i, i))
                .unwrap_or_else(|| panic!("entry {} missing from:\n{}", i, out))
        })
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

// ============================================================================
// Response sources
// ============================================================================

#[tokio::test]
async fn mock_short_input_gets_short_reply_within_delay() {
    let dir = TempDir::new().unwrap();
    let source = Box::new(MockSource::new(
        "MockBot",
        &MockConfig {
            tool_call_probability: 0.0,
            seed: Some(11),
            ..MockConfig::default()
        },
    ));
    let mut chat = session(&dir, &[], source);

    let started = Instant::now();
    chat.handle_line("hi").await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(2));

    let transcript = chat.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role(), Role::User);
    assert_eq!(transcript[0].content(), "hi");
    assert_eq!(transcript[1].role(), Role::Assistant);
    let short: Vec<String> = Bucket::Short
        .templates()
        .iter()
        .map(|t| agent_cli::agent::mock::fill_template(t, "hi"))
        .collect();
    assert!(short.contains(&transcript[1].content().to_string()));
}

#[tokio::test]
async fn chat_input_is_forwarded_verbatim() {
    let dir = TempDir::new().unwrap();
    let mut chat = session(&dir, &[], quiet_mock(2));
    chat.handle_line("  exit now please  ").await.unwrap();
    assert_eq!(chat.transcript()[0].content(), "  exit now please  ");
}

#[tokio::test]
async fn remote_failure_yields_one_system_message_and_loop_continues() {
    let dir = TempDir::new().unwrap();
    let source = Box::new(RemoteSource::new("Helper", FlakyService::new(1)));
    let mut chat = session(&dir, &["what is rust?", "and cargo?", "exit"], source);

    assert_eq!(chat.run().await.unwrap(), SessionEnd::ExitCommand);

    let roles: Vec<Role> = chat.transcript().iter().map(|m| m.role()).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::System, Role::User, Role::Tool, Role::Assistant]
    );
    assert!(chat.transcript()[1].content().contains("connection refused"));
    assert_eq!(chat.transcript()[3].tool_name(), Some("bing_grounding (completed)"));
    assert_eq!(chat.transcript()[4].content(), "You asked: and cargo?");

    let out = output(&chat);
    assert!(out.contains("⚠ System"));
    assert!(out.contains("🔧 Helper → bing_grounding (completed)"));
    assert!(out.contains("🤖 Helper"));
}

#[tokio::test]
async fn every_rendered_row_fits_the_frame() {
    use unicode_width::UnicodeWidthStr;

    let dir = TempDir::new().unwrap();
    let mut chat = session(&dir, &[], quiet_mock(4));
    chat.handle_line(
        "please walk me through designing a resilient ingestion pipeline for logs",
    )
    .await
    .unwrap();

    for row in output(&chat).lines().filter(|l| l.starts_with(['╭', '│', '╰'])) {
        assert_eq!(row.width(), 72, "row {:?}", row);
    }
}
