use anyhow::Result;
use tokio::task::JoinHandle;

use crate::api::BackendClient;

/// Greeting seeded into every new conversation.
pub const WELCOME: &str = "Hello! I'm Brampton, your finance AI assistant. \
Ask me anything about investing, markets, economics, or financial planning!";

/// Shown in place of a reply when the backend call fails for any reason.
pub const FALLBACK_REPLY: &str = "Sorry, I'm having trouble connecting to the server. \
Please make sure the backend is running on localhost:8000 and Ollama is running.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "Brampton",
        }
    }
}

/// One transcript entry. Entries are never edited or removed once pushed.
#[derive(Debug, Clone)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

pub struct App {
    // Core state
    pub should_quit: bool,

    // Conversation transcript (append-only, seeded with the greeting)
    pub messages: Vec<Message>,

    // Pending input
    pub input: String,
    pub input_cursor: usize, // char index into input

    // Request in flight: at most one at a time. `awaiting_reply` gates new
    // submissions; `reply_task` carries the outcome back to the event loop.
    pub awaiting_reply: bool,
    pub reply_task: Option<JoinHandle<Result<String>>>,

    // Chat viewport state (updated during render)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub backend: BackendClient,
}

impl App {
    pub fn new(backend: BackendClient) -> Self {
        Self {
            should_quit: false,
            messages: vec![Message {
                sender: Sender::Assistant,
                text: WELCOME.to_string(),
            }],
            input: String::new(),
            input_cursor: 0,
            awaiting_reply: false,
            reply_task: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            backend,
        }
    }

    /// Submit the pending input as a user message and dispatch the backend
    /// call. Silently does nothing for blank input or while a request is
    /// already in flight, so repeated Enter presses are safe.
    pub fn submit(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() || self.awaiting_reply {
            return;
        }

        self.input.clear();
        self.input_cursor = 0;
        self.messages.push(Message {
            sender: Sender::User,
            text: text.clone(),
        });
        self.awaiting_reply = true;
        self.scroll_to_bottom();

        let backend = self.backend.clone();
        self.reply_task = Some(tokio::spawn(async move { backend.chat(&text).await }));
    }

    /// Check whether the in-flight request has settled, and if so fold its
    /// outcome into the transcript. Called once per event-loop turn; the
    /// tick event keeps the loop turning while we wait.
    pub async fn poll_reply(&mut self) {
        let finished = self
            .reply_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.reply_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(join_err) => Err(anyhow::anyhow!("reply task failed: {join_err}")),
            };
            self.apply_reply(result);
        }
    }

    /// Fold a settled request into the transcript: the reply text on
    /// success, the fixed fallback on any failure. The busy gate is cleared
    /// last, after the assistant entry exists, on both branches.
    pub fn apply_reply(&mut self, result: Result<String>) {
        let text = result.unwrap_or_else(|_| FALLBACK_REPLY.to_string());
        self.messages.push(Message {
            sender: Sender::Assistant,
            text,
        });
        self.awaiting_reply = false;
        self.scroll_to_bottom();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.awaiting_reply {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Transcript scrolling
    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self
            .transcript_line_count()
            .saturating_sub(self.chat_height);
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max_scroll);
    }

    /// Pin the viewport to the newest entry. Runs after every append and
    /// covers the typing indicator while a reply is pending.
    pub fn scroll_to_bottom(&mut self) {
        let total_lines = self.transcript_line_count();
        let visible = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible {
            self.chat_scroll = total_lines - visible;
        } else {
            self.chat_scroll = 0;
        }
    }

    /// Rendered line count of the transcript at the current chat width,
    /// mirroring the character wrap the chat paragraph applies.
    fn transcript_line_count(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;
        for msg in &self.messages {
            total += 1; // sender label line
            for line in msg.text.lines() {
                // Character count, not byte length, for UTF-8 content
                let chars = line.chars().count();
                if chars == 0 {
                    total += 1;
                } else {
                    total += ((chars / wrap_width) + 1) as u16;
                }
            }
            total += 1; // blank line after message
        }

        if self.awaiting_reply {
            total += 2; // label + "Thinking..." line
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn test_app() -> App {
        App::new(BackendClient::new("http://localhost:8000"))
    }

    #[test]
    fn test_new_seeds_greeting() {
        let app = test_app();
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].sender, Sender::Assistant);
        assert_eq!(app.messages[0].text, WELCOME);
        assert!(app.input.is_empty());
        assert!(!app.awaiting_reply);
    }

    #[tokio::test]
    async fn test_submit_appends_user_entry_and_sets_busy() {
        let mut app = test_app();
        app.input = "  What is a stock?  ".to_string();
        app.input_cursor = app.input.chars().count();

        app.submit();

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].sender, Sender::User);
        assert_eq!(app.messages[1].text, "What is a stock?");
        assert!(app.input.is_empty());
        assert_eq!(app.input_cursor, 0);
        assert!(app.awaiting_reply);
        assert!(app.reply_task.is_some());
    }

    #[test]
    fn test_submit_blank_input_is_a_noop() {
        let mut app = test_app();
        app.input = "   \n  ".to_string();

        app.submit();
        app.submit(); // idempotent: a second pass changes nothing either

        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.input, "   \n  "); // buffer is not cleared
        assert!(!app.awaiting_reply);
        assert!(app.reply_task.is_none());
    }

    #[tokio::test]
    async fn test_submit_while_busy_is_dropped() {
        let mut app = test_app();
        app.input = "a".to_string();
        app.submit();

        app.input = "b".to_string();
        app.submit();

        let user_entries: Vec<_> = app
            .messages
            .iter()
            .filter(|m| m.sender == Sender::User)
            .collect();
        assert_eq!(user_entries.len(), 1);
        assert_eq!(user_entries[0].text, "a");
        assert_eq!(app.input, "b"); // dropped submission leaves the buffer alone

        // After the first request settles, the next submission goes through.
        app.apply_reply(Ok("alpha".to_string()));
        assert!(!app.awaiting_reply);

        app.submit();
        assert_eq!(app.messages.last().unwrap().text, "b");
        assert!(app.awaiting_reply);
    }

    #[tokio::test]
    async fn test_cycle_grows_transcript_by_two() {
        let mut app = test_app();
        let before = app.messages.len();

        app.input = "What is a stock?".to_string();
        app.submit();
        app.apply_reply(Ok("A share of ownership in a company.".to_string()));

        assert_eq!(app.messages.len(), before + 2);
        assert_eq!(app.messages[before].sender, Sender::User);
        assert_eq!(app.messages[before + 1].sender, Sender::Assistant);
        assert_eq!(
            app.messages[before + 1].text,
            "A share of ownership in a company."
        );
        assert!(!app.awaiting_reply);
    }

    #[tokio::test]
    async fn test_failed_reply_uses_fallback_and_clears_busy() {
        let mut app = test_app();
        app.input = "foo".to_string();
        app.submit();

        app.apply_reply(Err(anyhow!("connection refused")));

        assert_eq!(app.messages.len(), 3);
        assert_eq!(app.messages[1].text, "foo");
        assert_eq!(app.messages[2].sender, Sender::Assistant);
        assert_eq!(app.messages[2].text, FALLBACK_REPLY);
        assert!(!app.awaiting_reply);
    }

    #[tokio::test]
    async fn test_poll_reply_settles_finished_task() {
        let mut app = test_app();
        app.awaiting_reply = true;
        app.reply_task = Some(tokio::spawn(async { Ok("the market went up".to_string()) }));

        while app.reply_task.is_some() {
            app.poll_reply().await;
            tokio::task::yield_now().await;
        }

        assert_eq!(app.messages.last().unwrap().text, "the market went up");
        assert!(!app.awaiting_reply);
    }

    #[test]
    fn test_tick_animation_only_while_busy() {
        let mut app = test_app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.awaiting_reply = true;
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 2);
        app.tick_animation();
        assert_eq!(app.animation_frame, 0); // wraps at three frames
    }

    #[test]
    fn test_scroll_to_bottom_pins_long_transcripts() {
        let mut app = test_app();
        app.chat_width = 20;
        app.chat_height = 5;
        for i in 0..10 {
            app.messages.push(Message {
                sender: Sender::User,
                text: format!("message number {i}"),
            });
        }

        app.scroll_to_bottom();
        assert!(app.chat_scroll > 0);

        // Short transcripts stay at the top.
        let mut short = test_app();
        short.chat_width = 80;
        short.chat_height = 40;
        short.scroll_to_bottom();
        assert_eq!(short.chat_scroll, 0);
    }
}
